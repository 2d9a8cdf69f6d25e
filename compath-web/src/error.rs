//! Error types for compath-web

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use compath_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not an admin (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// compath-common error
    #[error("Common error: {0}")]
    Common(#[from] CommonError),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(err) => {
                let message = err.to_string();
                match err {
                    CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
                    CommonError::InvalidInput(_) => {
                        (StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
                    }
                    CommonError::InvalidVoteType(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_VOTE_TYPE", message)
                    }
                    CommonError::InvalidMappingType(_) => {
                        (StatusCode::BAD_REQUEST, "INVALID_MAPPING_TYPE", message)
                    }
                    CommonError::PathwayNotFound { .. } => {
                        (StatusCode::BAD_REQUEST, "PATHWAY_NOT_FOUND", message)
                    }
                    CommonError::UnknownResource(_) => {
                        error!("{}", message);
                        (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_RESOURCE", message)
                    }
                    _ => {
                        error!("Request failed: {}", message);
                        (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR", message)
                    }
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        if status == StatusCode::UNAUTHORIZED {
            return (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"compath\"")],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
