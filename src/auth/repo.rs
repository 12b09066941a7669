use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::auth::repo_types::{AccessToken, NewAccessToken};
use crate::db::StoreResult;

const TOKEN_COLUMNS: &str =
    "id, user_id, name, token_hash, expires_at, last_used_at, created_at";

#[async_trait]
pub trait TokenRepo: Send + Sync {
    async fn create(&self, new: NewAccessToken) -> StoreResult<AccessToken>;
    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<AccessToken>>;
    async fn touch(&self, id: i64, at: OffsetDateTime) -> StoreResult<()>;
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgTokenRepo {
    db: PgPool,
}

impl PgTokenRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepo for PgTokenRepo {
    async fn create(&self, new: NewAccessToken) -> StoreResult<AccessToken> {
        let token = sqlx::query_as::<_, AccessToken>(&format!(
            r#"
            INSERT INTO personal_access_tokens (user_id, name, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.token_hash)
        .bind(new.expires_at)
        .fetch_one(&self.db)
        .await?;
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> StoreResult<Option<AccessToken>> {
        let token = sqlx::query_as::<_, AccessToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM personal_access_tokens WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }

    async fn touch(&self, id: i64, at: OffsetDateTime) -> StoreResult<()> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
