//! Error taxonomy: domain-level [`ServiceError`] and its HTTP-facing [`AppError`] mapping.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::{ConflictKind, StorageError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the room's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested room or participant was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The room's wall-clock deadline has passed. Distinct from not-found:
    /// the row still exists, the room is just dead.
    #[error("expired: {0}")]
    Expired(String),
    /// A uniqueness rule was violated (name already taken, vote already cast).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(ConflictKind::DuplicateName) => {
                ServiceError::Conflict("this name is already taken".into())
            }
            StorageError::Conflict(ConflictKind::DuplicateVote) => {
                ServiceError::Conflict("this participant has already voted".into())
            }
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Room exists but its lifetime is over.
    #[error("expired: {0}")]
    Expired(String),
    /// Operation is invalid for the room's current status.
    #[error("conflict: {0}")]
    StateConflict(String),
    /// An "already done" conflict (duplicate name, duplicate vote).
    #[error("conflict: {0}")]
    DuplicateConflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error kind included in response bodies.
    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "validation",
            AppError::NotFound(_) => "not-found",
            AppError::Expired(_) => "expired",
            AppError::StateConflict(_) => "state-conflict",
            AppError::DuplicateConflict(_) => "duplicate-conflict",
            AppError::ServiceUnavailable(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            // An installed backend failing a query is our fault (500); having
            // no backend at all is advertised as unavailability (503).
            ServiceError::Unavailable(source) => AppError::Internal(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::StateConflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Expired(message) => AppError::Expired(message),
            ServiceError::Conflict(message) => AppError::DuplicateConflict(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Expired(_) => StatusCode::GONE,
            AppError::StateConflict(_) | AppError::DuplicateConflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
