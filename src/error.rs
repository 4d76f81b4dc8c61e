use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::state::session::{InvalidTransition, JoinRejection};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested session was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A connection attempted a host-only action without being the bound host.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input or an operation not valid in the current state.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The question-generation collaborator failed or returned garbage.
    #[error("generation service failure: {0}")]
    ExternalService(String),
    /// Unexpected internal fault; details are logged, not surfaced.
    #[error("internal error")]
    Internal,
}

impl From<JoinRejection> for ServiceError {
    fn from(err: JoinRejection) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Upstream collaborator unavailable or misbehaving.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error")]
    Internal,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::ExternalService(message) => AppError::ServiceUnavailable(message),
            ServiceError::Internal => AppError::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
