use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the field name.
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                if let Some(field) = db_err.constraint().and_then(field_for_constraint) {
                    return StoreError::Duplicate(field);
                }
            }
        }
        StoreError::Other(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

fn field_for_constraint(constraint: &str) -> Option<&'static str> {
    match constraint {
        "users_email_key" => Some("email"),
        "users_username_key" => Some("username"),
        _ => None,
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not set")?;
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    Ok(db)
}
