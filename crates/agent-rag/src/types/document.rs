//! Page and chunk types
//!
//! A document never exists on its own: it is the `document_id` stamped on
//! every chunk produced from it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text extracted from a single page of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

impl Page {
    /// Create a page
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        Self {
            page_number,
            content: content.into(),
        }
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSource {
    /// Locator the document was loaded from
    pub locator: String,
    /// Page the chunk starts on (1-indexed)
    pub page_number: Option<u32>,
    /// Total pages in the document
    pub page_count: Option<u32>,
}

/// A bounded span of a document's text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Originating document (derived from the uploaded filename)
    pub document_id: String,
    /// Text content
    pub content: String,
    /// Source information
    pub source: ChunkSource,
    /// Character range in the concatenated document text
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: impl Into<String>,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document_id.into(),
            content,
            source,
            char_start,
            char_end,
            chunk_index,
        }
    }
}
