//! OpenAI-compatible embedding provider.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use docsift_core::error::{DocsiftError, DocsiftResult};
use docsift_core::traits::{Embedder, EmbedderConfig};

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";
pub(crate) const OLLAMA_API_URL: &str = "http://localhost:11434/v1";
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Embedding provider for any OpenAI-compatible `/embeddings` endpoint.
///
/// Ollama is served by the same type pointed at its `/v1` API.
pub struct OpenAIEmbedder {
    client: Client,
    config: EmbedderConfig,
    base_url: String,
    retry_delay: Duration,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder. Needs an API key from the config or
    /// `OPENAI_API_KEY`.
    pub fn new(config: EmbedderConfig) -> DocsiftResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DocsiftError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;
        Self::build(config, Some(api_key), OPENAI_API_URL)
    }

    /// Create an embedder for a local Ollama server. No key needed.
    pub fn ollama(config: EmbedderConfig) -> DocsiftResult<Self> {
        let api_key = config.api_key.clone();
        Self::build(config, api_key, OLLAMA_API_URL)
    }

    fn build(
        config: EmbedderConfig,
        api_key: Option<String>,
        default_base_url: &str,
    ) -> DocsiftResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url.to_string());
        url::Url::parse(&base_url).map_err(|e| {
            DocsiftError::Configuration(format!("Invalid base URL {}: {}", base_url, e))
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", api_key)
                    .parse()
                    .map_err(|_| DocsiftError::Configuration("Invalid API key format".to_string()))?,
            );
        }

        // Per-request timeouts are set in `request`.
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| {
                DocsiftError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Override the first backoff delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Only the text-embedding-3 family accepts a dimensions override.
    fn dimensions_param(&self) -> Option<usize> {
        self.config
            .model
            .starts_with("text-embedding-3")
            .then_some(self.config.embedding_dims)
    }

    async fn send_once(
        &self,
        request: &EmbeddingRequest<'_>,
        timeout: Duration,
    ) -> DocsiftResult<EmbeddingResponse> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocsiftError::timeout(format!(
                        "Embedding request timed out after {}s",
                        timeout.as_secs()
                    ))
                } else {
                    DocsiftError::remote(format!("Embedding request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DocsiftError::remote(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(DocsiftError::from_http_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| DocsiftError::embedding(format!("Failed to parse response: {}", e)))
    }

    async fn request(
        &self,
        input: EmbeddingInput<'_>,
        expected: usize,
        timeout: Duration,
    ) -> DocsiftResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input,
            dimensions: self.dimensions_param(),
        };

        let mut response = (|| async { self.send_once(&request, timeout).await })
            .retry(
                ExponentialBuilder::default()
                    .with_max_times(self.config.max_retries)
                    .with_min_delay(self.retry_delay),
            )
            .when(|e: &DocsiftError| e.is_transient())
            .notify(|err, dur| {
                warn!(
                    model = %self.config.model,
                    error = %err,
                    retry_in_ms = dur.as_millis() as u64,
                    "Embedding request failed, retrying"
                );
            })
            .await?;

        if response.data.len() != expected {
            return Err(DocsiftError::embedding_count_mismatch(
                expected,
                response.data.len(),
            ));
        }

        response.data.sort_by_key(|d| d.index);
        debug!(model = %self.config.model, count = expected, "Embeddings received");
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> DocsiftResult<Vec<f32>> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let mut vectors = self.request(EmbeddingInput::Single(text), 1, timeout).await?;
        vectors
            .pop()
            .ok_or_else(|| DocsiftError::embedding("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> DocsiftResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let timeout = Duration::from_secs(self.config.batch_timeout_secs);
        self.request(EmbeddingInput::Batch(texts), texts.len(), timeout)
            .await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmbedderConfig {
        EmbedderConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let embedder = OpenAIEmbedder::new(config()).unwrap();
        assert_eq!(embedder.dimension(), 1536);
        assert_eq!(embedder.model_name(), "text-embedding-ada-002");
        assert_eq!(embedder.base_url(), OPENAI_API_URL);
        assert_eq!(embedder.dimensions_param(), None);
    }

    #[test]
    fn test_dimensions_param_for_v3_models() {
        let embedder = OpenAIEmbedder::new(EmbedderConfig {
            model: "text-embedding-3-small".into(),
            embedding_dims: 512,
            ..config()
        })
        .unwrap();
        assert_eq!(embedder.dimensions_param(), Some(512));
    }

    #[test]
    fn test_input_serialization() {
        let batch = vec!["a".to_string(), "b".to_string()];
        let single = serde_json::to_value(EmbeddingRequest {
            model: "m",
            input: EmbeddingInput::Single("hello"),
            dimensions: None,
        })
        .unwrap();
        let many = serde_json::to_value(EmbeddingRequest {
            model: "m",
            input: EmbeddingInput::Batch(&batch),
            dimensions: Some(8),
        })
        .unwrap();

        assert_eq!(single["input"], "hello");
        assert!(single.get("dimensions").is_none());
        assert_eq!(many["input"], serde_json::json!(["a", "b"]));
        assert_eq!(many["dimensions"], 8);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let embedder = OpenAIEmbedder::ollama(EmbedderConfig::default()).unwrap();
        assert_eq!(embedder.base_url(), OLLAMA_API_URL);
    }
}
