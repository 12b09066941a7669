use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{db::StoreError, validation::FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", .0.summary())]
    Validation(FieldErrors),

    #[error("{}", .0.summary())]
    Conflict(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Too many requests")]
    RateLimited,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) | AppError::Conflict(errors) => Some(errors),
            _ => None,
        }
    }

    fn into_response_with(self, status: StatusCode) -> Response {
        let body = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                ErrorBody {
                    error: "Internal server error".into(),
                    errors: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                errors: other.field_errors().cloned(),
            },
        };

        if matches!(self, AppError::RateLimited) {
            return (status, [(header::RETRY_AFTER, "60")], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => AppError::Conflict(FieldErrors::single(
                field,
                format!("The {field} has already been taken."),
            )),
            StoreError::Other(e) => AppError::Internal(e),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        self.into_response_with(status)
    }
}

/// Error wrapper for endpoints that answer invalid input with 422.
#[derive(Debug)]
pub struct Unprocessable(pub AppError);

impl From<AppError> for Unprocessable {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for Unprocessable {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ref other => other.status(),
        };
        self.0.into_response_with(status)
    }
}
