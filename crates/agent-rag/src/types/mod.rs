//! Core types for the RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Page};
pub use query::QueryRequest;
pub use response::{QueryResponse, UploadResponse};
