//! Error types for the resize service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::{FailureClass, PipelineError};

// == App Error Enum ==
/// Request-scoped error type; every variant maps to one HTTP status.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed query parameters
    #[error("failed validate: {0}")]
    Validation(String),

    /// Source image rejected (too big, undecodable, wrong format)
    #[error("{0}")]
    BadRequest(String),

    /// Source image could not be reached
    #[error("{0}")]
    NotFound(String),

    /// Upstream answered with something unusable
    #[error("{0}")]
    BadGateway(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.client_message();
        match err.class() {
            FailureClass::BadGateway => AppError::BadGateway(message),
            FailureClass::NotFound => AppError::NotFound(message),
            FailureClass::BadRequest => AppError::BadRequest(message),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string()
        }));

        (self.status(), body).into_response()
    }
}

// == Cache Error Enum ==
/// Startup-time cache configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The entry store cannot hold a single item (zero byte budget)
    #[error("invalid cache item capacity: {0}")]
    InvalidCapacity(usize),
}

// == Result Type Alias ==
/// Convenience Result type for request handling.
pub type Result<T> = std::result::Result<T, AppError>;
