use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::FieldError;

// Failure reported by a rendering backend
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CaptureError {
    pub message: String,
}

impl CaptureError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// Everything that ends a request early, one response per variant
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input")]
    Validation(Vec<FieldError>),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("screenshot failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid input", "details": details }),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Rate limit exceeded" }),
            ),
            AppError::Capture(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Screenshot failed", "details": err.message }),
            ),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error", "details": message }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = ?status, error = ?self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}
