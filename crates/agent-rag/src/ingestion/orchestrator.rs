//! Ingestion pipeline: locator -> local file -> pages -> chunks -> vector index

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

use super::{DocumentLoader, IngestionError, TextChunker};
use crate::providers::object_store::{Locator, ObjectStore, RemoteLocator};
use crate::retrieval::VectorIndex;

/// A document's bytes resolved to a local file for the duration of one call
enum LocalSource {
    /// Caller-owned path, used as-is
    Borrowed(PathBuf),
    /// Downloaded copy; the file is removed when this value is dropped
    Temporary(NamedTempFile),
}

impl LocalSource {
    fn path(&self) -> &Path {
        match self {
            LocalSource::Borrowed(path) => path,
            LocalSource::Temporary(file) => file.path(),
        }
    }

    /// Remove the temporary copy, logging (not failing) on error
    fn release(self) {
        if let LocalSource::Temporary(file) = self {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e);
            }
        }
    }
}

/// Sequences loader, chunker and vector index for one document at a time
pub struct IngestPipeline {
    object_store: Arc<dyn ObjectStore>,
    loader: Arc<dyn DocumentLoader>,
    chunker: TextChunker,
    index: Arc<dyn VectorIndex>,
    temp_dir: PathBuf,
    replace_existing: bool,
}

impl IngestPipeline {
    /// Create a new pipeline
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        loader: Arc<dyn DocumentLoader>,
        chunker: TextChunker,
        index: Arc<dyn VectorIndex>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            object_store,
            loader,
            chunker,
            index,
            temp_dir,
            replace_existing: false,
        }
    }

    /// Swap out a document's previously stored chunks instead of appending
    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    /// Ingest one document and return the number of chunks stored
    ///
    /// Any temporary download is removed on every exit path.
    pub async fn ingest(&self, locator: &str, document_id: &str) -> Result<usize, IngestionError> {
        if document_id.trim().is_empty() {
            return Err(IngestionError::InvalidInput(
                "document_id must not be empty".to_string(),
            ));
        }

        let start = Instant::now();
        let parsed = Locator::parse(locator)
            .map_err(|e| IngestionError::SourceUnavailable(e.to_string()))?;

        let source = self.resolve(parsed).await?;
        let outcome = self.process(&source, locator, document_id).await;
        source.release();

        match &outcome {
            Ok(count) => tracing::info!(
                document_id,
                locator,
                chunks = count,
                "Ingested document in {:.1}s",
                start.elapsed().as_secs_f64()
            ),
            Err(e) => tracing::error!(
                document_id,
                locator,
                kind = e.kind(),
                "Ingestion failed: {}",
                e
            ),
        }

        outcome
    }

    async fn process(
        &self,
        source: &LocalSource,
        locator: &str,
        document_id: &str,
    ) -> Result<usize, IngestionError> {
        let pages = self.loader.load(source.path()).await?;
        tracing::debug!(document_id, pages = pages.len(), "Loaded document with {}", self.loader.name());

        let chunks = self.chunker.chunk_pages(document_id, locator, &pages);
        if chunks.is_empty() {
            return Err(IngestionError::ParseFailure(
                "Document contains no text".to_string(),
            ));
        }

        if self.replace_existing {
            let removed = self
                .index
                .replace_document(document_id, &chunks)
                .await
                .map_err(|e| IngestionError::StoreFailure(e.to_string()))?;
            if removed > 0 {
                tracing::info!(document_id, removed, "Replaced previously stored chunks");
            }
        } else {
            self.index
                .add(&chunks)
                .await
                .map_err(|e| IngestionError::StoreFailure(e.to_string()))?;
        }

        Ok(chunks.len())
    }

    /// Materialize the locator as a local file
    async fn resolve(&self, locator: Locator) -> Result<LocalSource, IngestionError> {
        match locator {
            Locator::Local(path) => {
                if !path.is_file() {
                    return Err(IngestionError::SourceUnavailable(format!(
                        "{} is not a readable file",
                        path.display()
                    )));
                }
                Ok(LocalSource::Borrowed(path))
            }
            Locator::Remote(remote) => {
                let file = self.allocate_temp(&remote)?;
                // `file` is dropped (and deleted) if the download fails.
                self.download(&remote, file.path()).await?;
                Ok(LocalSource::Temporary(file))
            }
        }
    }

    fn allocate_temp(&self, remote: &RemoteLocator) -> Result<NamedTempFile, IngestionError> {
        let suffix = remote
            .extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        tempfile::Builder::new()
            .prefix("ingest-")
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)
            .map_err(|e| {
                IngestionError::SourceUnavailable(format!(
                    "Cannot allocate temporary file in {}: {}",
                    self.temp_dir.display(),
                    e
                ))
            })
    }

    async fn download(&self, remote: &RemoteLocator, dest: &Path) -> Result<(), IngestionError> {
        if remote.scheme != self.object_store.scheme() {
            return Err(IngestionError::SourceUnavailable(format!(
                "No object store for scheme '{}' (configured: {})",
                remote.scheme,
                self.object_store.name()
            )));
        }

        let data = self
            .object_store
            .fetch(remote)
            .await
            .map_err(|e| IngestionError::SourceUnavailable(format!("{}: {}", remote, e)))?;

        tokio::fs::write(dest, &data).await.map_err(|e| {
            IngestionError::SourceUnavailable(format!(
                "Cannot write temporary copy of {}: {}",
                remote, e
            ))
        })?;

        tracing::debug!(locator = %remote, bytes = data.len(), "Fetched remote document");
        Ok(())
    }
}
