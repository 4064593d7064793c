//! Ollama completion provider.
//!
//! Talks to Ollama's OpenAI-compatible `/v1` endpoint, so no API key is
//! needed and the wire format is shared with [`OpenAIProvider`].

use std::time::Duration;

use async_trait::async_trait;

use docsift_core::error::DocsiftResult;
use docsift_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
use docsift_core::types::Message;

use crate::openai::OpenAIProvider;

pub(crate) const OLLAMA_API_URL: &str = "http://localhost:11434/v1";
const OLLAMA_DEFAULT_MODEL: &str = "llama3.2";

/// Ollama LLM provider.
pub struct OllamaLlm {
    inner: OpenAIProvider,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider.
    ///
    /// The OpenAI default model name is swapped for a local one.
    pub fn new(mut config: LlmConfig) -> DocsiftResult<Self> {
        if config.model.is_empty() || config.model == LlmConfig::default().model {
            config.model = OLLAMA_DEFAULT_MODEL.to_string();
        }
        let api_key = config.api_key.clone();
        Ok(Self {
            inner: OpenAIProvider::build(config, api_key, OLLAMA_API_URL)?,
        })
    }

    pub fn with_retry_delay(self, delay: Duration) -> Self {
        Self {
            inner: self.inner.with_retry_delay(delay),
        }
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }
}

#[async_trait]
impl Llm for OllamaLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> DocsiftResult<LlmResponse> {
        self.inner.generate(messages, options).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
