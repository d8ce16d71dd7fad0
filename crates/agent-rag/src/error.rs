//! Error types for the RAG service

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingestion::IngestionError;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected client input (reported as 400)
    #[error("{0}")]
    Validation(String),

    /// Request refused by an extractor (oversized or malformed body)
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Document ingestion failed
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Upload accepted but storing or ingesting it failed
    #[error("Failed to process file: {0}")]
    UploadFailed(String),

    /// Object storage error
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorDb(String),

    /// LLM / agent error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Upstream service answered with a non-success status
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a rejection carrying its own status
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create an upload failure from the underlying cause
    pub fn upload_failed(cause: impl std::fmt::Display) -> Self {
        Self::UploadFailed(cause.to_string())
    }

    /// Create an object store error
    pub fn object_store(message: impl Into<String>) -> Self {
        Self::ObjectStore(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector db error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Rejected { .. } => "rejected_request",
            Error::Ingestion(err) => err.kind(),
            Error::UploadFailed(_) => "upload_failed",
            Error::ObjectStore(_) => "object_store_error",
            Error::Embedding(_) => "embedding_error",
            Error::VectorDb(_) => "vector_db_error",
            Error::Llm(_) => "llm_error",
            Error::Upstream { .. } => "upstream_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether a retry of the failed upstream call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream { status, .. } => *status == 429 || *status >= 500,
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Rejected { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        }

        let body = Json(json!({ "detail": self.to_string() }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = Error::validation("Query cannot be empty.").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_infrastructure_errors_map_to_server_error() {
        let errors = [
            Error::object_store("bucket unreachable"),
            Error::Ingestion(IngestionError::StoreFailure("disk full".to_string())),
            Error::llm("quota"),
            Error::upload_failed("bucket unreachable"),
        ];
        for err in errors {
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_rejection_keeps_status() {
        let err = Error::rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big");
        assert_eq!(err.kind(), "rejected_request");
        assert_eq!(err.to_string(), "too big");
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_upload_failure_message() {
        let err = Error::upload_failed(IngestionError::ParseFailure("corrupt xref".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to process file: Failed to parse document: corrupt xref"
        );
    }

    #[test]
    fn test_retryable_statuses() {
        let upstream = |status| Error::Upstream {
            service: "gemini",
            status,
            message: String::new(),
        };
        assert!(upstream(429).is_retryable());
        assert!(upstream(503).is_retryable());
        assert!(!upstream(400).is_retryable());
        assert!(!Error::validation("nope").is_retryable());
    }
}
