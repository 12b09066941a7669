use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreResult;
use crate::users::repo_types::{NewUser, User, UserChanges};

const USER_COLUMNS: &str =
    "id, name, surname, username, email, password_hash, created_at, updated_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// All users in insertion order.
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Fails with `StoreError::Duplicate` when username or email is taken.
    async fn create(&self, new: NewUser) -> StoreResult<User>;
    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>>;
    /// Removes the user together with every job and access token they own.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, surname, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   surname       = COALESCE($3, surname),
                   username      = COALESCE($4, username),
                   email         = COALESCE($5, email),
                   password_hash = COALESCE($6, password_hash),
                   updated_at    = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.surname)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM personal_access_tokens WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM jobs WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }
}
