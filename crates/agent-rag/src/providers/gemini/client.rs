//! HTTP client for the Gemini API (`generativelanguage.googleapis.com`)

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Longest upstream error body kept in error messages
const MAX_ERROR_BODY: usize = 500;

/// API-key authenticated Gemini client with retries
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry_policy(),
        })
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let url = &url;
        self.retry
            .run(path, || async move {
                let response = self
                    .http
                    .post(url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(body)
                    .send()
                    .await?;
                Self::decode(response).await
            })
            .await
    }

    /// GET a JSON resource
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        let url = &url;
        self.retry
            .run(path, || async move {
                let response = self
                    .http
                    .get(url)
                    .header("x-goog-api-key", &self.api_key)
                    .send()
                    .await?;
                Self::decode(response).await
            })
            .await
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(Error::Upstream {
                service: "gemini",
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
