//! Configuration for the RAG service
//!
//! Every section has a `Default`; `RagConfig::from_env` overlays environment
//! variables on top of the defaults and rejects incomplete configurations so the
//! server never starts half-configured.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Content type accepted by the upload endpoint
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// Gemini (reasoning + embedding provider) configuration
    pub gemini: GeminiConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Ingestion configuration
    pub ingestion: IngestionConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Where uploaded files are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Google Cloud Storage
    #[default]
    Gcs,
    /// Local filesystem (development)
    Local,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gcs" | "gcp" => Ok(Self::Gcs),
            "local" | "fs" => Ok(Self::Local),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}' (expected 'gcs' or 'local')",
                other
            ))),
        }
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend provider
    pub backend: StorageBackend,
    /// Bucket uploaded files are written to (required)
    pub bucket: String,
    /// Root directory for the local backend
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Gcs,
            bucket: String::new(),
            local_root: PathBuf::from("./uploads"),
        }
    }
}

/// Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (required)
    #[serde(skip_serializing)]
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Model driving the agent
    pub chat_model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Requested embedding width; the model's native width when unset
    pub embedding_dimensions: Option<usize>,
    /// Temperature for the agent model
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Upper bound on model calls per question
    pub max_agent_iterations: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            embedding_dimensions: None,
            temperature: 0.2,
            timeout_secs: 120,
            max_retries: 2,
            max_agent_iterations: 8,
        }
    }
}

impl GeminiConfig {
    /// Retry policy for Gemini requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(500))
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Directory the collection is persisted to
    pub persist_directory: PathBuf,
    /// Collection name
    pub collection_name: String,
    /// Chunks returned to the agent per search
    pub top_k: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            persist_directory: PathBuf::from("./chroma_db_storage"),
            collection_name: "rag_collection".to_string(),
            top_k: 4,
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Directory for temporary downloads (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    /// Delete a document's previous chunks before storing new ones
    pub replace_existing_chunks: bool,
}

impl IngestionConfig {
    /// Resolved directory for temporary downloads
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl RagConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        config.storage.bucket = get("GCS_BUCKET_NAME").ok_or_else(|| {
            Error::Config("GCS_BUCKET_NAME must be set".to_string())
        })?;
        config.gemini.api_key = get("GOOGLE_API_KEY").ok_or_else(|| {
            Error::Config("GOOGLE_API_KEY must be set".to_string())
        })?;

        if let Some(backend) = get("STORAGE_BACKEND") {
            config.storage.backend = backend.parse()?;
        }
        if let Some(root) = get("LOCAL_STORAGE_DIR") {
            config.storage.local_root = PathBuf::from(root);
        }

        if let Some(dir) = get("CHROMA_DB_DIR") {
            config.vector_db.persist_directory = PathBuf::from(dir);
        }
        if let Some(name) = get("RAG_COLLECTION_NAME") {
            config.vector_db.collection_name = name;
        }
        if let Some(top_k) = get("RETRIEVER_TOP_K") {
            config.vector_db.top_k = parse_value("RETRIEVER_TOP_K", &top_k)?;
        }

        if let Some(host) = get("HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("PORT") {
            config.server.port = parse_value("PORT", &port)?;
        }
        if let Some(cors) = get("ENABLE_CORS") {
            config.server.enable_cors = parse_value("ENABLE_CORS", &cors)?;
        }
        if let Some(size) = get("MAX_UPLOAD_SIZE") {
            config.server.max_upload_size = parse_value("MAX_UPLOAD_SIZE", &size)?;
        }

        if let Some(url) = get("GEMINI_BASE_URL") {
            config.gemini.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("GEMINI_CHAT_MODEL") {
            config.gemini.chat_model = model;
        }
        if let Some(model) = get("GEMINI_EMBEDDING_MODEL") {
            config.gemini.embedding_model = model;
        }
        if let Some(dimensions) = get("GEMINI_EMBEDDING_DIMENSIONS") {
            config.gemini.embedding_dimensions =
                Some(parse_value("GEMINI_EMBEDDING_DIMENSIONS", &dimensions)?);
        }
        if let Some(temperature) = get("LLM_TEMPERATURE") {
            config.gemini.temperature = parse_value("LLM_TEMPERATURE", &temperature)?;
        }
        if let Some(timeout) = get("LLM_TIMEOUT_SECS") {
            config.gemini.timeout_secs = parse_value("LLM_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(retries) = get("LLM_MAX_RETRIES") {
            config.gemini.max_retries = parse_value("LLM_MAX_RETRIES", &retries)?;
        }
        if let Some(iterations) = get("AGENT_MAX_ITERATIONS") {
            config.gemini.max_agent_iterations =
                parse_value("AGENT_MAX_ITERATIONS", &iterations)?;
        }

        if let Some(dir) = get("INGEST_TEMP_DIR") {
            config.ingestion.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(replace) = get("REPLACE_EXISTING_CHUNKS") {
            config.ingestion.replace_existing_chunks =
                parse_value("REPLACE_EXISTING_CHUNKS", &replace)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that must hold before startup
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.trim().is_empty() {
            return Err(Error::Config("Storage bucket name is empty".to_string()));
        }
        if self.gemini.api_key.trim().is_empty() {
            return Err(Error::Config("Gemini API key is empty".to_string()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.vector_db.collection_name.trim().is_empty() {
            return Err(Error::Config("Collection name is empty".to_string()));
        }
        if self.vector_db.top_k == 0 {
            return Err(Error::Config("RETRIEVER_TOP_K must be at least 1".to_string()));
        }
        if self.gemini.embedding_dimensions == Some(0) {
            return Err(Error::Config(
                "GEMINI_EMBEDDING_DIMENSIONS must be at least 1".to_string(),
            ));
        }
        if self.gemini.max_agent_iterations == 0 {
            return Err(Error::Config(
                "AGENT_MAX_ITERATIONS must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: '{}' ({})", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_required_values_and_defaults() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("GCS_BUCKET_NAME", "my_buckets99"),
            ("GOOGLE_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.storage.bucket, "my_buckets99");
        assert_eq!(config.storage.backend, StorageBackend::Gcs);
        assert_eq!(config.vector_db.persist_directory, PathBuf::from("./chroma_db_storage"));
        assert_eq!(config.vector_db.collection_name, "rag_collection");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert!(!config.ingestion.replace_existing_chunks);
        assert_eq!(config.gemini.embedding_dimensions, None);
    }

    #[test]
    fn test_missing_bucket_fails() {
        let err = RagConfig::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "secret")]))
            .unwrap_err();
        assert!(err.to_string().contains("GCS_BUCKET_NAME"));
    }

    #[test]
    fn test_blank_api_key_fails() {
        let err = RagConfig::from_lookup(lookup_from(&[
            ("GCS_BUCKET_NAME", "bucket"),
            ("GOOGLE_API_KEY", "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = RagConfig::from_lookup(lookup_from(&[
            ("GCS_BUCKET_NAME", "bucket"),
            ("GOOGLE_API_KEY", "secret"),
            ("CHROMA_DB_DIR", "/var/lib/rag"),
            ("STORAGE_BACKEND", "local"),
            ("PORT", "9090"),
            ("REPLACE_EXISTING_CHUNKS", "true"),
            ("GEMINI_BASE_URL", "http://localhost:8089/"),
            ("GEMINI_EMBEDDING_MODEL", "gemini-embedding-001"),
            ("GEMINI_EMBEDDING_DIMENSIONS", "3072"),
        ]))
        .unwrap();

        assert_eq!(config.vector_db.persist_directory, PathBuf::from("/var/lib/rag"));
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.server.port, 9090);
        assert!(config.ingestion.replace_existing_chunks);
        assert_eq!(config.gemini.base_url, "http://localhost:8089");
        assert_eq!(config.gemini.embedding_model, "gemini-embedding-001");
        assert_eq!(config.gemini.embedding_dimensions, Some(3072));
    }

    #[test]
    fn test_zero_embedding_dimensions_rejected() {
        let err = RagConfig::from_lookup(lookup_from(&[
            ("GCS_BUCKET_NAME", "bucket"),
            ("GOOGLE_API_KEY", "secret"),
            ("GEMINI_EMBEDDING_DIMENSIONS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_EMBEDDING_DIMENSIONS"));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = RagConfig::from_lookup(lookup_from(&[
            ("GCS_BUCKET_NAME", "bucket"),
            ("GOOGLE_API_KEY", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.storage.bucket = "bucket".to_string();
        config.gemini.api_key = "secret".to_string();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }
}
