//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use crate::web::response::error_response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dashboard_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request failed validation. Rendered as a 400.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or rejected credentials. Rendered as a 401.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rendered as a 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// Builds a `map_err` adapter that logs the underlying error and turns it
    /// into a 500 carrying `message`.
    pub fn internal<E: std::fmt::Debug>(message: &'static str) -> impl FnOnce(E) -> ApiError {
        move |err| {
            error!("{}: {:?}", message, err);
            ApiError::Internal(message.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Internal(m) => m,
            ApiError::Port(PortError::NotFound(_)) => "Resource not found".to_string(),
            other => {
                error!("Unhandled error: {:?}", other);
                "Internal server error".to_string()
            }
        };
        error_response(status, message)
    }
}
