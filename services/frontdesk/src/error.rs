//! Custom error types for the front-desk service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{password::PasswordError, token::TokenError};

/// Custom error type for the front-desk service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Absent, malformed, expired or forged token; unknown or inactive user
    #[error("Unauthorized")]
    Unauthorized,

    /// Login rejected; never says whether the account exists
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but lacking the admin flag
    #[error("Forbidden")]
    Forbidden,

    /// Resource missing or outside the caller's branch
    #[error("Not found: {0}")]
    NotFound(String),

    /// Login throttled
    #[error("Too many requests")]
    TooManyRequests,

    /// Anything unexpected; the cause is logged, never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts, try again later".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::Conflict(constraint) => {
                ApiError::BadRequest(format!("Record already exists ({})", constraint))
            }
            other => {
                error!("Database failure: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        error!("Token failure: {}", e);
        ApiError::Internal(e.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        error!("Password hashing failure: {}", e);
        ApiError::Internal(e.to_string())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
