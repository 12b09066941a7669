use std::sync::Arc;

use crate::auth::repo::{PgTokenRepo, TokenRepo};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StorageBackend};
use crate::db;
use crate::jobs::repo::{JobRepo, PgJobRepo};
use crate::memory::MemoryStore;
use crate::users::repo::{PgUserRepo, UserRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub jobs: Arc<dyn JobRepo>,
    pub tokens: Arc<dyn TokenRepo>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match config.backend {
            StorageBackend::Postgres => {
                let pool = db::connect(&config).await?;
                Ok(Self {
                    config: Arc::new(config),
                    users: Arc::new(PgUserRepo::new(pool.clone())),
                    jobs: Arc::new(PgJobRepo::new(pool.clone())),
                    tokens: Arc::new(PgTokenRepo::new(pool)),
                    clock,
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("using the in-memory store; data is lost on restart");
                Ok(Self::in_memory(config, clock))
            }
        }
    }

    pub fn in_memory(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = MemoryStore::new(clock.clone());
        Self {
            config: Arc::new(config),
            users: Arc::new(store.clone()),
            jobs: Arc::new(store.clone()),
            tokens: Arc::new(store),
            clock,
        }
    }

    /// In-memory state with default config, for unit tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(AppConfig::in_memory(), Arc::new(SystemClock))
    }
}
