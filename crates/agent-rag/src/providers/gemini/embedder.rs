//! Gemini embeddings via `batchEmbedContents`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::GeminiClient;
use crate::error::{Error, Result};
use crate::providers::embedding::EmbeddingProvider;

/// Maximum texts per `batchEmbedContents` request
const MAX_BATCH_SIZE: usize = 100;

/// Native width of text-embedding-004
const DEFAULT_DIMENSIONS: usize = 768;

/// Gemini embedding provider
///
/// Without an explicit width the model's native output is accepted as-is;
/// the vector index keeps a collection's widths consistent.
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
    model: String,
    dimensions: Option<usize>,
}

impl GeminiEmbedder {
    /// Create a new embedder for `model` (e.g. "text-embedding-004")
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions: None,
        }
    }

    /// Request `dimensions`-wide vectors and reject any other width
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    async fn embed_chunk(&self, texts: &[String], task_type: TaskType) -> Result<Vec<Vec<f32>>> {
        let model = self.model_path();
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: model.clone(),
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                    task_type,
                    output_dimensionality: self.dimensions,
                })
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .client
            .post_json(&format!("{}:batchEmbedContents", model), &request)
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Requested {} embeddings, received {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        let embeddings: Vec<Vec<f32>> = response.embeddings.into_iter().map(|e| e.values).collect();
        if let Some(bad) = embeddings.iter().find(|e| e.is_empty()) {
            return Err(Error::embedding(format!(
                "Empty embedding from {} ({} values)",
                self.model,
                bad.len()
            )));
        }
        if let Some(expected) = self.dimensions {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(Error::embedding(format!(
                    "Expected {} dimensions from {}, got {}",
                    expected,
                    self.model,
                    bad.len()
                )));
            }
        }

        Ok(embeddings)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    model: String,
    content: Content,
    task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_chunk(&[text.to_string()], TaskType::RetrievalQuery)
            .await?
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            embeddings.extend(self.embed_chunk(batch, TaskType::RetrievalDocument).await?);
        }
        tracing::debug!(count = embeddings.len(), model = %self.model, "Generated embeddings");
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions.unwrap_or(DEFAULT_DIMENSIONS)
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get_json::<serde_json::Value>(&self.model_path()).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Gemini embedding health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
