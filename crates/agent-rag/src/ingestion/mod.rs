//! Document ingestion: locator resolution, PDF loading, chunking, indexing

mod chunker;
mod loader;
mod orchestrator;

use thiserror::Error;

pub use chunker::TextChunker;
pub use loader::{DocumentLoader, PdfLoader};
pub use orchestrator::IngestPipeline;

/// Why a single document could not be ingested
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// Locator unreachable or unreadable
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Unsupported or corrupt document content
    #[error("Failed to parse document: {0}")]
    ParseFailure(String),

    /// Vector index write failed
    #[error("Failed to store chunks: {0}")]
    StoreFailure(String),

    /// Caller violated a precondition (e.g. empty document id)
    #[error("Invalid ingestion request: {0}")]
    InvalidInput(String),
}

impl IngestionError {
    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            IngestionError::SourceUnavailable(_) => "source_unavailable",
            IngestionError::ParseFailure(_) => "parse_failure",
            IngestionError::StoreFailure(_) => "store_failure",
            IngestionError::InvalidInput(_) => "invalid_input",
        }
    }
}
