//! agent-rag: question answering over uploaded PDFs
//!
//! Uploaded PDFs are stored in Google Cloud Storage, split into overlapping
//! character chunks, embedded with Gemini and kept in a persisted vector
//! collection. Questions are answered by a Gemini tool-calling agent whose only
//! tool is `document_retriever`, a similarity search over that collection.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod retry;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestPipeline, IngestionError};
pub use server::RagServer;
pub use types::{Chunk, ChunkSource, QueryRequest, QueryResponse, UploadResponse};
