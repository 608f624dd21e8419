//! Application-level error type returned by handlers.
//!
//! All variants serialise to [`ErrorResponse`] JSON and map to the
//! appropriate HTTP status code. Internal detail is logged here and never
//! sent to the client.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use vibecheck::ConfigError;
use vibecheck_api::{error::codes, ErrorResponse};

/// An error that a handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    InvalidJson(String),
    BatchTooLarge(String),
    UnprocessableEntity(String),
    MissingCredential,
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidJson(msg) => (StatusCode::BAD_REQUEST, codes::INVALID_JSON, msg),
            AppError::BatchTooLarge(msg) => (StatusCode::BAD_REQUEST, codes::BATCH_TOO_LARGE, msg),
            AppError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, codes::VALIDATION_FAILED, msg)
            }
            AppError::MissingCredential => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::MISSING_CREDENTIAL,
                ConfigError::MissingCredential.to_string(),
            ),
            AppError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::INTERNAL_ERROR,
                    "Verification failed".to_string(),
                )
            }
        };
        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::MissingCredential => AppError::MissingCredential,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidJson(e.body_text())
    }
}
