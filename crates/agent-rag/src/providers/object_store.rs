//! Object store provider trait for raw uploaded files

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// A parsed locator: where a document's raw bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Path on the local filesystem
    Local(PathBuf),
    /// Object in a remote store (`scheme://bucket/key`)
    Remote(RemoteLocator),
}

/// `scheme://bucket/key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocator {
    pub scheme: String,
    pub bucket: String,
    pub key: String,
}

impl RemoteLocator {
    /// Build a locator from its parts
    pub fn new(scheme: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// File extension of the key, if any
    pub fn extension(&self) -> Option<&str> {
        let name = self.key.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then_some(ext)
    }
}

impl fmt::Display for RemoteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl Locator {
    /// Parse a locator string
    ///
    /// `file://<path>` and strings without a scheme are local paths.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::validation("Locator is empty"));
        }

        let Some((scheme, rest)) = raw.split_once("://") else {
            return Ok(Self::Local(PathBuf::from(raw)));
        };

        if scheme.eq_ignore_ascii_case("file") {
            return Ok(Self::Local(PathBuf::from(rest)));
        }

        match rest.split_once('/') {
            Some((bucket, key)) if !scheme.is_empty() && !bucket.is_empty() && !key.is_empty() => {
                Ok(Self::Remote(RemoteLocator::new(scheme, bucket, key)))
            }
            _ => Err(Error::validation(format!(
                "Malformed locator '{}' (expected scheme://bucket/key)",
                raw
            ))),
        }
    }
}

/// Trait for durable blob storage of uploaded files
///
/// Implementations:
/// - `GcsObjectStore`: Google Cloud Storage (`gs://` locators)
/// - `LocalObjectStore`: Local filesystem (path locators)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, overwriting any existing object
    ///
    /// Returns the locator of the stored object.
    async fn put(&self, key: &str, content_type: &str, data: Vec<u8>) -> Result<String>;

    /// Fetch the bytes behind a remote locator
    async fn fetch(&self, locator: &RemoteLocator) -> Result<Vec<u8>>;

    /// Scheme of the locators this store produces and can fetch
    fn scheme(&self) -> &str;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let locator = Locator::parse("gs://my_buckets99/reports/q3.pdf").unwrap();
        assert_eq!(
            locator,
            Locator::Remote(RemoteLocator::new("gs", "my_buckets99", "reports/q3.pdf"))
        );
    }

    #[test]
    fn test_parse_local() {
        assert_eq!(
            Locator::parse("/tmp/doc.pdf").unwrap(),
            Locator::Local(PathBuf::from("/tmp/doc.pdf"))
        );
        assert_eq!(
            Locator::parse("file:///tmp/doc.pdf").unwrap(),
            Locator::Local(PathBuf::from("/tmp/doc.pdf"))
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(Locator::parse("gs://bucket-only").is_err());
        assert!(Locator::parse("gs:///key").is_err());
        assert!(Locator::parse("gs://bucket/").is_err());
        assert!(Locator::parse("   ").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let remote = RemoteLocator::new("gs", "bucket", "a/b.pdf");
        assert_eq!(remote.to_string(), "gs://bucket/a/b.pdf");
        assert_eq!(remote.extension(), Some("pdf"));
        assert_eq!(RemoteLocator::new("gs", "bucket", "README").extension(), None);
    }
}
