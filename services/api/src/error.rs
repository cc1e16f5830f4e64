//! Error responses for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::ServiceError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by API endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Invalid path parameter: {0}")]
    Path(#[from] PathRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
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
            ApiError::Body(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Path(rejection) => {
                warn!("Rejected path parameter: {}", rejection.body_text());
                (StatusCode::BAD_REQUEST, self.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for endpoint results
pub type ApiResult<T> = Result<T, ApiError>;
