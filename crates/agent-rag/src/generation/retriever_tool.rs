//! `document_retriever`: similarity search over the vector index as an agent tool

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::agent::{Tool, ToolSpec};
use super::prompt::{format_passages, RETRIEVER_TOOL_DESCRIPTION, RETRIEVER_TOOL_NAME};
use crate::error::{Error, Result};
use crate::retrieval::VectorIndex;

/// Retrieval tool returning the text of the `top_k` most similar chunks
pub struct RetrieverTool {
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl RetrieverTool {
    pub fn new(index: Arc<dyn VectorIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

#[async_trait]
impl Tool for RetrieverTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: RETRIEVER_TOOL_NAME.to_string(),
            description: RETRIEVER_TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "query to look up in the uploaded documents"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: &Value) -> Result<String> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::validation("document_retriever requires a non-empty 'query'"))?;

        let results = self.index.search(query, self.top_k).await?;
        tracing::debug!(query, hits = results.len(), "Retrieved chunks");

        Ok(format_passages(results.iter().map(|r| r.chunk.content.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::prompt::NO_DOCUMENTS_FOUND;
    use crate::retrieval::LocalVectorIndex;
    use crate::test_support::{chunk, HashEmbedder};

    async fn index_with(texts: &[&str]) -> (tempfile::TempDir, Arc<LocalVectorIndex>) {
        let dir = tempfile::tempdir().unwrap();
        let index = LocalVectorIndex::open(dir.path(), "tool_test", Arc::new(HashEmbedder::default()))
            .await
            .unwrap();
        let chunks: Vec<_> = texts.iter().map(|t| chunk("doc.pdf", t)).collect();
        index.add(&chunks).await.unwrap();
        (dir, Arc::new(index))
    }

    #[tokio::test]
    async fn test_returns_best_match_first() {
        let (_dir, index) = index_with(&[
            "the cat sat on the mat",
            "quarterly revenue grew by ten percent",
        ])
        .await;
        let tool = RetrieverTool::new(index, 1);

        let observation = tool
            .call(&json!({"query": "quarterly revenue grew"}))
            .await
            .unwrap();

        assert_eq!(observation, "quarterly revenue grew by ten percent");
    }

    #[tokio::test]
    async fn test_joins_top_k_passages() {
        let (_dir, index) = index_with(&["alpha one", "beta two", "gamma three"]).await;
        let observation = RetrieverTool::new(index, 2)
            .call(&json!({"query": "alpha"}))
            .await
            .unwrap();

        assert_eq!(observation.split("\n\n").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let (_dir, index) = index_with(&[]).await;
        let observation = RetrieverTool::new(index, 4)
            .call(&json!({"query": "anything"}))
            .await
            .unwrap();
        assert_eq!(observation, NO_DOCUMENTS_FOUND);
    }

    #[tokio::test]
    async fn test_missing_query_is_error() {
        let (_dir, index) = index_with(&[]).await;
        let tool = RetrieverTool::new(index, 4);
        assert!(tool.call(&json!({})).await.is_err());
        assert_eq!(tool.spec().name, "document_retriever");
    }
}
