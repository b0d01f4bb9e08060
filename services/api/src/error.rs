//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session on a protected route
    #[error("Not authenticated")]
    Unauthorized,

    /// Telegram login payload failed verification
    #[error("Invalid Telegram authentication")]
    InvalidAuth,

    /// Valid credential, but the user is not on the allow-list
    #[error("User not allowed")]
    Forbidden,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Task absent, or owned by someone else
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database error; detail is logged server-side, the client only
    /// sees a generic message
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            ApiError::InvalidAuth => (
                StatusCode::UNAUTHORIZED,
                "Invalid Telegram authentication".to_string(),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "User not allowed".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
