//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, ErrorKind};

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    /// The disease catalogue failed; `code` tells which way.
    #[error("Upstream failure ({code}): {message}")]
    Upstream { code: &'static str, message: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Upstream { code, message } => (StatusCode::BAD_GATEWAY, code, message),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Could not save or load records. Please retry.".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ApiError::NotFound(err.user_message()),
            ErrorKind::Validation => ApiError::BadRequest(err.user_message()),
            ErrorKind::Network => ApiError::Upstream {
                code: "UPSTREAM_UNAVAILABLE",
                message: err.user_message(),
            },
            ErrorKind::Authentication => ApiError::Upstream {
                code: "UPSTREAM_AUTH",
                message: err.user_message(),
            },
            ErrorKind::MalformedResponse => ApiError::Upstream {
                code: "UPSTREAM_MALFORMED",
                message: err.user_message(),
            },
            ErrorKind::Store => ApiError::Internal(err.to_string()),
        }
    }
}

/// Malformed or mistyped request bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
