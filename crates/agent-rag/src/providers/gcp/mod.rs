//! Google Cloud Platform providers
//!
//! Raw uploads are kept in Google Cloud Storage; reasoning and embeddings go
//! through the Gemini API (see `providers::gemini`).

mod gcs_store;

pub use gcs_store::GcsObjectStore;
