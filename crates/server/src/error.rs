// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeline_jobs::RegistryError;
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

/// JSON envelope used by every endpoint: `{"status": ..., "data": ...}`.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Payload carrying a human-readable message.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of every error response
pub type ErrorResponse = Envelope<MessageData>;

impl ErrorResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: MessageData::new(message),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, ErrorResponse::error(msg.clone()))
            }
            ApiError::PayloadTooLarge(msg) => {
                tracing::warn!(message = %msg, "Upload rejected");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ErrorResponse::error("file is too large"),
                )
            }
            ApiError::Storage(storage_err) => {
                tracing::error!(error = %storage_err, "Saving upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::error("error saving file"),
                )
            }
            ApiError::Registry(registry_err) => {
                tracing::error!(error = %registry_err, "Registering job failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::error("internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::path::PathBuf;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_bad_request_returns_400_with_message() {
        let error = ApiError::BadRequest("id is required".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, "error");
        assert_eq!(body.data.message, "id is required");
    }

    #[tokio::test]
    async fn test_payload_too_large_returns_413() {
        let error = ApiError::PayloadTooLarge("length limit exceeded".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.data.message, "file is too large");
    }

    #[tokio::test]
    async fn test_storage_error_returns_500() {
        let error = ApiError::Storage(StorageError::Write {
            path: PathBuf::from("/uploads/x.csv"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        });
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.data.message, "error saving file");
    }

    #[tokio::test]
    async fn test_registry_error_hides_details() {
        let error = ApiError::Registry(RegistryError::DuplicateId("abc".to_string()));
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.data.message, "internal server error");
    }

    #[test]
    fn test_envelope_serialization() {
        let json = serde_json::to_string(&Envelope::success(MessageData::new("task paused"))).unwrap();
        assert_eq!(json, r#"{"status":"success","data":{"message":"task paused"}}"#);

        let json = serde_json::to_string(&ErrorResponse::error("invalid task id")).unwrap();
        assert_eq!(json, r#"{"status":"error","data":{"message":"invalid task id"}}"#);
    }

    #[test]
    fn test_api_error_from_storage_error() {
        let storage_err = StorageError::CreateDir {
            path: PathBuf::from("/uploads"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let api_err: ApiError = storage_err.into();
        assert!(matches!(api_err, ApiError::Storage(_)));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::BadRequest("id is required".to_string());
        assert_eq!(err.to_string(), "Bad request: id is required");

        let err = ApiError::Registry(RegistryError::DuplicateId("abc".to_string()));
        assert_eq!(err.to_string(), "Registry error: Job already registered: abc");
    }
}
