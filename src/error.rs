//! Error types for the task-list API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == API Error Enum ==
/// Unified error type for the task-list API.
///
/// Every variant is terminal and user-visible; the server never retries on
/// behalf of the client. Store-layer failures collapse into `Internal` and
/// are logged rather than exposed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bearer token missing, invalid or expired
    #[error("missing or invalid bearer token")]
    Unauthenticated,

    /// Task absent, or owned by a different session
    #[error("not found")]
    NotFound,

    /// Request body failed validation
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// Session or task capacity reached
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Too many requests within the rate-limit window
    #[error("too many requests")]
    RateLimited,

    /// Store or other internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::QuotaExceeded(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            ApiError::Internal(cause) => {
                // The cause is logged server-side, never sent to the client.
                error!("Internal error: {}", cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the task-list API.
pub type Result<T> = std::result::Result<T, ApiError>;
