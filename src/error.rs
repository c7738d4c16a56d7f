//! Error types for the muxy control plane
//!
//! Errors are converted to the HTTP responses the two kinds of callers
//! expect: validation failures surface to the CRUD caller as 400s, and
//! admission failures surface to the media server as 403/404. Storage
//! failures map to 503 so the media server can tell "unknown stream key"
//! apart from "control plane down".

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

/// Result type for muxy operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("overlap conflict: {0}")]
    OverlapConflict(String),

    #[error("out of event bounds: {0}")]
    OutOfEventBounds(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email delivery failed: {0}")]
    Email(String),
}

/// JSON body attached to every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidSchedule(_)
            | AppError::OverlapConflict(_)
            | AppError::OutOfEventBounds(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Email(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidSchedule(_) => "invalid_schedule",
            AppError::OverlapConflict(_) => "overlap_conflict",
            AppError::OutOfEventBounds(_) => "out_of_event_bounds",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "unavailable",
            AppError::Email(_) => "email_error",
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
