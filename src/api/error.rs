//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::facade::{ImportError, RecordError};
use crate::storage::StorageError;

pub use crate::facade::STORAGE_ERROR_MESSAGE;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Storage operation failed
    StorageError(String),

    /// Invalid request parameters or record fields
    InvalidRequest(String),

    /// Add-only create hit an existing alert name
    Conflict(String),

    /// Resource not found
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::StorageError(msg) => {
                error!("storage failure while handling request: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    STORAGE_ERROR_MESSAGE.to_string(),
                )
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_duplicate_key() {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::StorageError(err.to_string())
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(e) => ApiError::InvalidRequest(e.to_string()),
            RecordError::Storage(e) => e.into(),
            RecordError::NothingToExport => {
                ApiError::NotFound(RecordError::NothingToExport.to_string())
            }
            RecordError::Csv(msg) => ApiError::StorageError(msg),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}
