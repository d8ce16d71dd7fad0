//! Local filesystem object store
//!
//! Development stand-in for GCS. Objects live under `<root>/<bucket>/<key>` and
//! the returned locator is the plain file path, so ingestion reads them in place.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

use super::object_store::{ObjectStore, RemoteLocator};

/// Filesystem-backed object store
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `<local_root>/<bucket>`
    pub async fn new(local_root: impl AsRef<Path>, bucket: &str) -> Result<Self> {
        let root = local_root.as_ref().join(bucket);
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!("Local object store at {}", root.display());
        Ok(Self { root })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::object_store(format!("Invalid object key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, _content_type: &str, data: Vec<u8>) -> Result<String> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| Error::object_store(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::debug!(bytes = data.len(), "Stored {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn fetch(&self, locator: &RemoteLocator) -> Result<Vec<u8>> {
        Err(Error::object_store(format!(
            "Local store cannot fetch remote locator {}",
            locator
        )))
    }

    fn scheme(&self) -> &str {
        "file"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "local"
    }
}
