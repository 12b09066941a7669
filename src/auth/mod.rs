use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
mod token;

pub(crate) use password::hash_password;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
