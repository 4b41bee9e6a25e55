//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use anggaran_core::CoreError;
use anggaran_storage::{SaveError, StorageError};

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details, such as the code of the offending item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Tree failed validation before save (422).
    #[error("validation failed: {message}")]
    ValidationFailed {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Internal or persistence failure (500).
    #[error("internal error: {0}")]
    InternalError(String),

    /// The edit would break a structural rule (409).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ApiErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: msg,
                    details: None,
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorDetail {
                    code: "BAD_REQUEST".to_string(),
                    message: msg,
                    details: None,
                },
            ),
            ApiError::ValidationFailed { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiErrorDetail {
                    code: "VALIDATION_FAILED".to_string(),
                    message,
                    details,
                },
            ),
            ApiError::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg,
                    details: None,
                },
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ApiErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: msg,
                    details: None,
                },
            ),
        };

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::ItemNotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::MissingName { code } => ApiError::ValidationFailed {
                details: Some(serde_json::json!({ "kode": code })),
                message: err.to_string(),
            },
            CoreError::LastRoot { .. }
            | CoreError::MaxDepthExceeded { .. }
            | CoreError::LevelMismatch { .. }
            | CoreError::NotPersisted { .. }
            | CoreError::DeletionChoiceRequired { .. }
            | CoreError::ItemMarked { .. }
            | CoreError::AncestorMarked { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::ItemNotFound(_)
            | StorageError::CategoryNotFound(_)
            | StorageError::PeriodNotFound(_) => ApiError::NotFound(err.to_string()),
            StorageError::IntegrityError { .. } => ApiError::Conflict(err.to_string()),
            StorageError::Sqlite(_) | StorageError::Migration(_) => {
                tracing::error!(error = %err, "storage failure");
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Rejected(core) => core.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_name_is_unprocessable() {
        let err: ApiError = CoreError::MissingName { code: "A.2".into() }.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(body["error"]["details"]["kode"], "A.2");
    }

    #[test]
    fn structural_errors_conflict() {
        let err: ApiError = CoreError::LastRoot { code: "A".into() }.into();
        assert!(matches!(err, ApiError::Conflict(_)));
        let err: ApiError = CoreError::MaxDepthExceeded {
            code: "A.1.1.1".into(),
            level: 4,
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
        let err: ApiError = CoreError::ItemMarked { code: "A.1".into() }.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn failed_save_step_is_internal() {
        let err: ApiError = SaveError::Create {
            code: "A.1".into(),
            source: StorageError::Migration("disk full".into()),
        }
        .into();
        match err {
            ApiError::InternalError(msg) => assert!(msg.contains("'A.1'")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn store_not_found_is_404() {
        let err: ApiError = StorageError::ItemNotFound(7).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
