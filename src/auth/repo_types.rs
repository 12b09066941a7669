use sqlx::FromRow;
use time::OffsetDateTime;

/// Issued access token. Only the SHA-256 digest of the secret is stored.
#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub expires_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl AccessToken {
    /// Expired once `now` is past `expires_at`; the deadline itself is
    /// still valid. Tokens without an expiry never lapse on their own.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub user_id: i64,
    pub name: String,
    pub token_hash: String,
    pub expires_at: Option<OffsetDateTime>,
}
