//! Provider abstractions for embeddings, chat models and object storage
//!
//! This module provides trait-based abstractions that allow switching between
//! local (filesystem) and cloud (GCS) storage, and isolate the Gemini API.

pub mod embedding;
pub mod gemini;
pub mod local;
pub mod object_store;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiChat, GeminiClient, GeminiEmbedder};
pub use local::LocalObjectStore;
pub use object_store::{Locator, ObjectStore, RemoteLocator};
