use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// LLM failures never appear here: they are folded into each candidate's analysis.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Multipart(e) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_UPLOAD", e.body_text())
            }
            AppError::Extraction(e @ ExtractionError::UnsupportedFormat { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNSUPPORTED_FORMAT",
                e.to_string(),
            ),
            AppError::Extraction(e) => {
                tracing::warn!("Extraction error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_ERROR",
                    e.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
