//! Document loading: local file -> page texts

use async_trait::async_trait;
use std::path::Path;

use super::IngestionError;
use crate::types::Page;

/// Materializes the text pages of a local document
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the pages of the document at `path`
    ///
    /// Unreadable files map to `SourceUnavailable`, undecodable content to
    /// `ParseFailure`.
    async fn load(&self, path: &Path) -> Result<Vec<Page>, IngestionError>;

    /// Get loader name for logging
    fn name(&self) -> &str;
}

/// PDF loader (pdf-extract, with lopdf as fallback)
#[derive(Debug, Clone, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a PDF loader
    pub fn new() -> Self {
        Self
    }

    /// Extract pages from in-memory PDF bytes
    pub fn parse(data: &[u8]) -> Result<Vec<Page>, IngestionError> {
        let primary = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data));

        let text = match primary {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::debug!("pdf-extract produced no text, trying lopdf");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf", e);
                None
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked, trying lopdf");
                None
            }
        };

        let pages = match text {
            Some(text) => split_pages(&text),
            None => Self::parse_with_lopdf(data)?,
        };

        if pages.is_empty() {
            return Err(IngestionError::ParseFailure(
                "PDF has no extractable text (it may be image-based)".to_string(),
            ));
        }

        Ok(pages)
    }

    /// Fallback extraction, one lopdf call per page
    fn parse_with_lopdf(data: &[u8]) -> Result<Vec<Page>, IngestionError> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| IngestionError::ParseFailure(format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    let content = clean_text(&text);
                    if !content.trim().is_empty() {
                        pages.push(Page::new(*page_number, content));
                    }
                }
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                }
            }
        }

        Ok(pages)
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Page>, IngestionError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            IngestionError::SourceUnavailable(format!("Cannot read {}: {}", path.display(), e))
        })?;

        tokio::task::spawn_blocking(move || Self::parse(&data))
            .await
            .map_err(|e| IngestionError::ParseFailure(format!("PDF extraction task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

/// Split extracted text on form feeds (page breaks), dropping empty pages
fn split_pages(text: &str) -> Vec<Page> {
    text.split('\u{c}')
        .map(clean_text)
        .enumerate()
        .filter(|(_, content)| !content.trim().is_empty())
        .map(|(i, content)| Page::new(i as u32 + 1, content))
        .collect()
}

fn clean_text(text: &str) -> String {
    text.replace('\0', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_on_form_feed() {
        let pages = split_pages("first page\u{c}second page\u{c}   ");
        assert_eq!(
            pages,
            vec![Page::new(1, "first page"), Page::new(2, "second page")]
        );
    }

    #[test]
    fn test_single_page_without_form_feed() {
        let pages = split_pages("only\0 page");
        assert_eq!(pages, vec![Page::new(1, "only page")]);
    }

    #[test]
    fn test_garbage_bytes_are_parse_failure() {
        let err = PdfLoader::parse(b"not a valid pdf").unwrap_err();
        assert!(matches!(err, IngestionError::ParseFailure(_)));
    }

    #[test]
    fn test_extracts_text_from_minimal_pdf() {
        let pages = PdfLoader::parse(&crate::test_support::minimal_pdf("quarterly revenue grew"))
            .unwrap();
        let text: String = pages.iter().map(|p| p.content.as_str()).collect();
        assert!(text.contains("quarterly revenue grew"), "got: {:?}", text);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfLoader::new()
            .load(&dir.path().join("absent.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();

        let err = PdfLoader::new().load(&path).await.unwrap_err();
        assert!(matches!(err, IngestionError::ParseFailure(_)));
    }
}
