//! Response types for the HTTP API

use serde::{Deserialize, Serialize};

/// Body returned by `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always "success"
    pub status: String,
    /// Uploaded filename
    pub filename: String,
    /// Where the raw file was stored
    pub locator: String,
    /// Same value as `locator`, kept for clients of the GCS-only API
    pub gcs_uri: String,
    /// Identifier stamped on every stored chunk
    pub document_id: String,
    /// Number of chunks written to the vector index
    pub chunks_stored: usize,
}

impl UploadResponse {
    /// Successful upload + ingestion
    pub fn success(
        filename: impl Into<String>,
        locator: impl Into<String>,
        document_id: impl Into<String>,
        chunks_stored: usize,
    ) -> Self {
        let locator = locator.into();
        Self {
            status: "success".to_string(),
            filename: filename.into(),
            gcs_uri: locator.clone(),
            locator,
            document_id: document_id.into(),
            chunks_stored,
        }
    }
}

/// Body returned by `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The question as submitted
    pub query: String,
    /// Synthesized answer (or the fallback text)
    pub answer: String,
}
