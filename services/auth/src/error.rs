//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::ServiceError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Any rejected login, whatever the cause
    #[error("Invalid username or password")]
    LoginFailed,
}

impl ApiError {
    /// Collapse authentication failures of a login attempt into `LoginFailed`
    pub fn login(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated => ApiError::LoginFailed,
            other => ApiError::Service(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::LoginFailed => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Service(err) => match err {
                ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, err.to_string()),
                ServiceError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                ServiceError::Persistence(source) => {
                    error!("Request failed: {}", source);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for endpoint results
pub type ApiResult<T> = Result<T, ApiError>;
