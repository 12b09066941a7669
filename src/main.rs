mod app;
mod auth;
mod clock;
mod config;
mod db;
mod error;
mod jobs;
mod json;
mod memory;
mod rate_limit;
mod state;
mod users;
mod validation;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "jobboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = ?config.backend,
        origin = %config.frontend_origin,
        rate_limit_per_minute = config.rate_limit_per_minute,
        "starting job board api"
    );

    let state = AppState::init(config.clone()).await?;
    let app = app::build_app(state)?;
    app::serve(app, &config).await
}
