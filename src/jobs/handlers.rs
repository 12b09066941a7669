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
    error::AppError,
    jobs::{
        dto::{CreateJobRequest, UpdateJobRequest},
        repo_types::Job,
        services,
    },
    json::{ApiJson, ApiPath},
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
        .route("/users/:id/jobs", get(list_jobs_by_user))
}

#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(services::list(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(services::get(&state, id).await?))
}

#[instrument(skip(state, auth, payload), fields(caller = auth.user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = services::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[instrument(skip(state, auth, payload), fields(caller = auth.user.id))]
pub async fn update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(services::update(&state, id, payload).await?))
}

#[instrument(skip(state, auth), fields(caller = auth.user.id))]
pub async fn delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete(&state, id).await?;
    Ok(Json(MessageResponse {
        message: "Job deleted successfully",
    }))
}

#[instrument(skip(state, auth), fields(caller = auth.user.id))]
pub async fn list_jobs_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Response, AppError> {
    let jobs = services::list_by_user(&state, user_id).await?;
    if jobs.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(MessageResponse {
                message: "No jobs found for this user.",
            }),
        )
            .into_response());
    }
    Ok(Json(jobs).into_response())
}
