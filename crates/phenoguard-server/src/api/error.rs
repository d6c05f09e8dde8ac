//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use phenoguard_core::db::DbError;

/// Client-facing message for extraction failures.
pub const PROCESSING_FAILED: &str = "NLP Processing Failed";

/// Client-facing message for audit failures.
pub const AUDIT_FAILED: &str = "Visual Audit Failed";

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
///
/// The 500-class variants carry internal detail for the log only; clients
/// see a fixed message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("NLP processing failed: {0}")]
    Processing(String),
    #[error("Visual audit failed: {0}")]
    Audit(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Processing(detail) => {
                tracing::error!(detail, "Error processing note");
                internal(PROCESSING_FAILED)
            }
            ApiError::Audit(detail) => {
                tracing::error!(detail, "Audit failed");
                internal(AUDIT_FAILED)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                internal("An internal error occurred")
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

fn internal(message: &str) -> (StatusCode, &'static str, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message.to_string())
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(detail) => ApiError::NotFound(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
