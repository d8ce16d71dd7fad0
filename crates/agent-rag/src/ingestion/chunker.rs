//! Fixed-size text chunking with overlap and page tracking

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Page};

/// Separator inserted between pages when they are concatenated
const PAGE_SEPARATOR: char = '\n';

/// Linear left-to-right chunker
///
/// Sizes are counted in characters. Each chunk starts `chunk_size - overlap`
/// characters after the previous one; the last chunk may be shorter.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Chunk size in characters
    chunk_size: usize,
    /// Overlap between neighbouring chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Distance between consecutive chunk starts
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Character ranges of the chunks covering a text of `len` characters
    pub fn spans(&self, len: usize) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start = 0;

        // A chunk past the first must reach beyond the previous chunk's overlap.
        while start < len && (start == 0 || start + self.overlap < len) {
            spans.push((start, (start + self.chunk_size).min(len)));
            start += self.step();
        }

        spans
    }

    /// Number of chunks a text of `len` characters produces
    pub fn expected_chunks(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let beyond_overlap = len.saturating_sub(self.overlap);
        beyond_overlap.div_ceil(self.step()).max(1)
    }

    /// Split raw text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        self.spans(chars.len())
            .into_iter()
            .map(|(start, end)| chars[start..end].iter().collect())
            .collect()
    }

    /// Chunk the concatenated pages of a document
    pub fn chunk_pages(&self, document_id: &str, locator: &str, pages: &[Page]) -> Vec<Chunk> {
        let mut chars: Vec<char> = Vec::new();
        // (char offset where the page begins, page number)
        let mut page_starts: Vec<(usize, u32)> = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                chars.push(PAGE_SEPARATOR);
            }
            page_starts.push((chars.len(), page.page_number));
            chars.extend(page.content.chars());
        }

        let page_count = (!pages.is_empty()).then_some(pages.len() as u32);

        self.spans(chars.len())
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| {
                let page_number = page_starts
                    .iter()
                    .take_while(|(offset, _)| *offset <= start)
                    .last()
                    .map(|(_, number)| *number);

                let source = ChunkSource {
                    locator: locator.to_string(),
                    page_number,
                    page_count,
                };

                Chunk::new(
                    document_id,
                    chars[start..end].iter().collect(),
                    source,
                    start,
                    end,
                    index as u32,
                )
            })
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}
