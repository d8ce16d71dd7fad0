//! Application state for the RAG server
//!
//! Every dependency is constructed once, eagerly, when the server starts; handlers
//! only ever see shared read-only handles.

use std::sync::Arc;

use crate::config::{RagConfig, StorageBackend};
use crate::error::{Error, Result};
use crate::generation::prompt::AGENT_SYSTEM_PROMPT;
use crate::generation::{AnswerService, ReasoningAgent, RetrieverTool, ToolAgent};
use crate::ingestion::{DocumentLoader, IngestPipeline, PdfLoader, TextChunker};
#[cfg(feature = "gcp")]
use crate::providers::gcp::GcsObjectStore;
use crate::providers::{
    GeminiChat, GeminiClient, GeminiEmbedder, LocalObjectStore, ObjectStore,
};
use crate::retrieval::{LocalVectorIndex, VectorIndex};
#[cfg(feature = "gcp")]
use crate::retry::RetryPolicy;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Where uploaded files are kept
    object_store: Arc<dyn ObjectStore>,
    /// Chunk index searched by the agent
    index: Arc<dyn VectorIndex>,
    /// Locator -> chunks -> index
    pipeline: IngestPipeline,
    /// Question answering
    answers: AnswerService,
}

impl AppState {
    /// Create application state from configuration, failing fast on any
    /// misconfigured dependency
    pub async fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Initializing RAG application state (storage: {:?}, bucket: {})...",
            config.storage.backend,
            config.storage.bucket
        );

        let object_store = build_object_store(&config).await?;
        tracing::info!("Object store initialized ({})", object_store.name());

        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        let mut embedder = GeminiEmbedder::new(gemini.clone(), &config.gemini.embedding_model);
        if let Some(dimensions) = config.gemini.embedding_dimensions {
            embedder = embedder.with_dimensions(dimensions);
        }
        let embedder = Arc::new(embedder);
        let index: Arc<dyn VectorIndex> = Arc::new(
            LocalVectorIndex::open(
                &config.vector_db.persist_directory,
                &config.vector_db.collection_name,
                embedder,
            )
            .await?,
        );
        tracing::info!(
            "Vector index initialized ({} chunks)",
            index.len().await?
        );

        let chat = Arc::new(GeminiChat::new(
            gemini,
            &config.gemini.chat_model,
            config.gemini.temperature,
        ));
        let agent = ToolAgent::new(chat, AGENT_SYSTEM_PROMPT, config.gemini.max_agent_iterations)
            .with_tool(Arc::new(RetrieverTool::new(
                index.clone(),
                config.vector_db.top_k,
            )));
        tracing::info!(
            "Agent initialized (model: {}, max iterations: {})",
            config.gemini.chat_model,
            config.gemini.max_agent_iterations
        );

        let temp_dir = config.ingestion.resolved_temp_dir();
        tokio::fs::create_dir_all(&temp_dir).await.map_err(|e| {
            Error::Config(format!(
                "Cannot create ingestion temp dir {}: {}",
                temp_dir.display(),
                e
            ))
        })?;

        Self::from_parts(
            config,
            object_store,
            Arc::new(PdfLoader::new()),
            index,
            Arc::new(agent),
        )
    }

    /// Assemble state from already-constructed dependencies
    pub fn from_parts(
        config: RagConfig,
        object_store: Arc<dyn ObjectStore>,
        loader: Arc<dyn DocumentLoader>,
        index: Arc<dyn VectorIndex>,
        agent: Arc<dyn ReasoningAgent>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
        let pipeline = IngestPipeline::new(
            object_store.clone(),
            loader,
            chunker,
            index.clone(),
            config.ingestion.resolved_temp_dir(),
        )
        .with_replace_existing(config.ingestion.replace_existing_chunks);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                object_store,
                index,
                pipeline,
                answers: AnswerService::new(agent),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the object store
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.object_store
    }

    /// Get the vector index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.inner.index
    }

    /// Get the ingestion pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get the answer service
    pub fn answers(&self) -> &AnswerService {
        &self.inner.answers
    }
}

async fn build_object_store(config: &RagConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.storage.backend {
        #[cfg(feature = "gcp")]
        StorageBackend::Gcs => Ok(Arc::new(
            GcsObjectStore::new(&config.storage.bucket, RetryPolicy::default()).await?,
        )),
        #[cfg(not(feature = "gcp"))]
        StorageBackend::Gcs => Err(Error::Config(
            "STORAGE_BACKEND=gcs requires the 'gcp' feature".to_string(),
        )),
        StorageBackend::Local => Ok(Arc::new(
            LocalObjectStore::new(&config.storage.local_root, &config.storage.bucket).await?,
        )),
    }
}
