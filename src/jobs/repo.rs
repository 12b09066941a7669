use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreResult;
use crate::jobs::repo_types::{Job, JobChanges, NewJob};

const JOB_COLUMNS: &str =
    "id, title, description, user_id, location, job_type, salary, created_at, updated_at";

#[async_trait]
pub trait JobRepo: Send + Sync {
    /// All jobs in insertion order.
    async fn list(&self) -> StoreResult<Vec<Job>>;
    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Job>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Job>>;
    async fn create(&self, new: NewJob) -> StoreResult<Job>;
    async fn update(&self, id: i64, changes: JobChanges) -> StoreResult<Option<Job>>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgJobRepo {
    db: PgPool,
}

impl PgJobRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn list(&self) -> StoreResult<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(jobs)
    }

    async fn list_by_user(&self, user_id: i64) -> StoreResult<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(jobs)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(job)
    }

    async fn create(&self, new: NewJob) -> StoreResult<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (title, description, user_id, location, job_type, salary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.user_id)
        .bind(&new.location)
        .bind(new.job_type)
        .bind(&new.salary)
        .fetch_one(&self.db)
        .await?;
        Ok(job)
    }

    async fn update(&self, id: i64, changes: JobChanges) -> StoreResult<Option<Job>> {
        let set_salary = changes.salary.is_some();
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
               SET title       = COALESCE($2, title),
                   description = COALESCE($3, description),
                   user_id     = COALESCE($4, user_id),
                   location    = COALESCE($5, location),
                   job_type    = COALESCE($6, job_type),
                   salary      = CASE WHEN $7 THEN $8 ELSE salary END,
                   updated_at  = now()
             WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.user_id)
        .bind(changes.location)
        .bind(changes.job_type)
        .bind(set_salary)
        .bind(changes.salary.flatten())
        .fetch_optional(&self.db)
        .await?;
        Ok(job)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
