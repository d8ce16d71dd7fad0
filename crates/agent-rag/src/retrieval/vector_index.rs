//! Vector index trait and the local, file-persisted collection

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

/// Search result from the vector index
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more similar)
    pub similarity: f32,
}

/// Trait for chunk storage and similarity search
///
/// Implementations embed text themselves; callers deal in chunks and query
/// strings only.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Embed and store chunks; either all of them are stored or none
    async fn add(&self, chunks: &[Chunk]) -> Result<()>;

    /// The `top_k` chunks most similar to `query`, best first
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Delete all chunks of a document, returning how many were removed
    async fn delete_by_document(&self, document_id: &str) -> Result<usize>;

    /// Swap a document's stored chunks for `chunks` in one write, returning
    /// how many old chunks were dropped
    ///
    /// On error the document's previous chunks are still in place.
    async fn replace_document(&self, document_id: &str, chunks: &[Chunk]) -> Result<usize>;

    /// Get total number of chunks stored
    async fn len(&self) -> Result<usize>;

    /// Check if the index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    entries: Vec<IndexEntry>,
}

/// Brute-force cosine index persisted as `<dir>/<collection>.json`
pub struct LocalVectorIndex {
    path: PathBuf,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<IndexEntry>>,
    /// Serializes writers so each one persists a consistent snapshot
    write_lock: Mutex<()>,
}

impl LocalVectorIndex {
    /// Open (or create) a named collection under `dir`
    pub async fn open(
        dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            Error::vector_db(format!("Cannot create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(format!("{}.json", collection));
        let entries = match tokio::fs::read(&path).await {
            Ok(data) => {
                let file: CollectionFile = serde_json::from_slice(&data).map_err(|e| {
                    Error::vector_db(format!("Corrupt collection file {}: {}", path.display(), e))
                })?;
                file.entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Error::vector_db(format!(
                    "Cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            collection,
            chunks = entries.len(),
            embedder = embedder.name(),
            "Opened vector collection at {}",
            path.display()
        );

        Ok(Self {
            path,
            collection: collection.to_string(),
            embedder,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the persisted collection
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stored_dimensions(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.embedding.len())
    }

    /// Embed `chunks` outside any lock
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<IndexEntry>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        Ok(chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect())
    }

    /// Replace the collection file with `entries`
    async fn persist(&self, entries: &[IndexEntry]) -> Result<()> {
        let file = CollectionFile {
            collection: self.collection.clone(),
            entries: entries.to_vec(),
        };
        let data = serde_json::to_vec(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await.map_err(|e| {
            Error::vector_db(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            Error::vector_db(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for LocalVectorIndex {
    async fn add(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let incoming = self.embed_chunks(chunks).await?;
        let _guard = self.write_lock.lock().await;

        let mut updated = self.entries.read().clone();
        check_dimensions(&updated, &incoming)?;
        updated.extend(incoming);

        self.persist(&updated).await?;
        let total = updated.len();
        *self.entries.write() = updated;

        tracing::debug!(added = chunks.len(), total, "Stored chunks in {}", self.collection);
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if top_k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        if let Some(dimensions) = self.stored_dimensions() {
            if query_embedding.len() != dimensions {
                return Err(Error::vector_db(format!(
                    "Query embedding has {} dimensions, collection uses {}",
                    query_embedding.len(),
                    dimensions
                )));
            }
        }

        let mut results: Vec<VectorSearchResult> = self
            .entries
            .read()
            .iter()
            .map(|entry| VectorSearchResult {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let current = self.entries.read().clone();
        let before = current.len();
        let kept: Vec<IndexEntry> = current
            .into_iter()
            .filter(|e| e.chunk.document_id != document_id)
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            self.persist(&kept).await?;
            *self.entries.write() = kept;
        }

        Ok(removed)
    }

    async fn replace_document(&self, document_id: &str, chunks: &[Chunk]) -> Result<usize> {
        let incoming = self.embed_chunks(chunks).await?;
        let _guard = self.write_lock.lock().await;

        let current = self.entries.read().clone();
        let before = current.len();
        let mut updated: Vec<IndexEntry> = current
            .into_iter()
            .filter(|e| e.chunk.document_id != document_id)
            .collect();
        let removed = before - updated.len();
        check_dimensions(&updated, &incoming)?;
        updated.extend(incoming);

        self.persist(&updated).await?;
        let total = updated.len();
        *self.entries.write() = updated;

        tracing::debug!(
            document_id,
            removed,
            added = chunks.len(),
            total,
            "Replaced document chunks in {}",
            self.collection
        );
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        let dir_ok = match self.path.parent() {
            Some(dir) => tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false),
            None => false,
        };
        Ok(dir_ok)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// New embeddings must be non-empty and match the collection's width
fn check_dimensions(existing: &[IndexEntry], incoming: &[IndexEntry]) -> Result<()> {
    let dimensions = existing
        .first()
        .or_else(|| incoming.first())
        .map(|e| e.embedding.len())
        .unwrap_or_default();

    match incoming
        .iter()
        .find(|e| e.embedding.is_empty() || e.embedding.len() != dimensions)
    {
        Some(bad) => Err(Error::vector_db(format!(
            "Embedding dimension mismatch: collection uses {}, got {}",
            dimensions,
            bad.embedding.len()
        ))),
        None => Ok(()),
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
