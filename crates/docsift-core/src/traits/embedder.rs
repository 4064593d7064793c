//! Embedder trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DocsiftResult;

/// Core Embedder trait - all embedding providers implement this.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> DocsiftResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    ///
    /// Any failure fails the whole batch.
    async fn embed_batch(&self, texts: &[String]) -> DocsiftResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get the dimension of the embeddings.
    fn dimension(&self) -> usize;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Model name/identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding dimensions.
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Timeout for a single-text request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for a batch request.
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embedding_dims() -> usize {
    1536
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            embedding_dims: default_embedding_dims(),
            api_key: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            batch_timeout_secs: default_batch_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Embedder provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    #[default]
    OpenAI,
    Ollama,
}
