// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{pipeline::ExtractionError, store::StoreError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., an exam code that is already taken)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => AppError::Conflict(format!("Duplicate {what}")),
            StoreError::MissingReference(what) => {
                AppError::BadRequest(format!("Unknown reference for {what}"))
            }
            StoreError::Database(e) => AppError::from(e),
        }
    }
}

/// A PDF that cannot be found or read is the caller's problem; a crashed
/// extraction task is ours.
impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Task(msg) => AppError::InternalServerError(msg),
            other => AppError::BadRequest(format!("Error processing PDF: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_client_errors() {
        assert!(matches!(
            AppError::from(StoreError::Conflict("exam".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::MissingReference("exam".into())),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_extraction_errors() {
        assert!(matches!(
            AppError::from(ExtractionError::NotFound("x.pdf".into())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(ExtractionError::Task("panicked".into())),
            AppError::InternalServerError(_)
        ));
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = AppError::InternalServerError("secret".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
