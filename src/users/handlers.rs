use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{AppError, Unprocessable},
    json::{ApiJson, ApiPath},
    state::AppState,
    users::{dto::UpdateUserRequest, repo_types::User, services},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
}

#[instrument(skip(state, auth), fields(caller = auth.user.id))]
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> Result<Response, AppError> {
    let users = services::list(&state).await?;
    if users.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "No users found",
            }),
        )
            .into_response());
    }
    Ok(Json(users).into_response())
}

#[instrument(skip(state, auth), fields(caller = auth.user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(services::get(&state, id).await?))
}

/// Invalid input answers 422 here, unlike the other write endpoints.
#[instrument(skip(state, auth, payload), fields(caller = auth.user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    payload: Result<ApiJson<UpdateUserRequest>, AppError>,
) -> Result<Json<User>, Unprocessable> {
    let ApiJson(payload) = payload?;
    Ok(Json(services::update(&state, id, payload).await?))
}

#[instrument(skip(state, auth), fields(caller = auth.user.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !services::delete(&state, id).await? {
        return Err(AppError::NotFound("User"));
    }
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
