//! OpenAI-compatible chat completion provider.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use docsift_core::error::{DocsiftError, DocsiftResult};
use docsift_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use docsift_core::types::{Message, MessageRole};

pub(crate) const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Chat completion provider for any OpenAI-compatible endpoint.
pub struct OpenAIProvider {
    client: Client,
    config: LlmConfig,
    base_url: String,
    retry_delay: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAIProvider {
    /// Create a provider for the OpenAI API. Needs an API key from the
    /// config or `OPENAI_API_KEY`.
    pub fn new(config: LlmConfig) -> DocsiftResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                DocsiftError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;
        Self::build(config, Some(api_key), OPENAI_API_URL)
    }

    /// Create a provider from its parts. `base_url` in the config wins over
    /// `default_base_url`.
    pub(crate) fn build(
        config: LlmConfig,
        api_key: Option<String>,
        default_base_url: &str,
    ) -> DocsiftResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| DocsiftError::Configuration(format!("Invalid base URL {}: {}", base_url, e)))?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", api_key)
                    .parse()
                    .map_err(|_| DocsiftError::Configuration("Invalid API key format".to_string()))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
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

    async fn send_once(&self, request: &ChatRequest<'_>) -> DocsiftResult<ChatResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocsiftError::timeout(format!(
                        "Completion request timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    DocsiftError::remote(format!("Completion request failed: {}", e))
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
            .map_err(|e| DocsiftError::llm(format!("Failed to parse response: {}", e)))
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> DocsiftResult<LlmResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: role_name(m.role),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: options.temperature.unwrap_or(self.config.temperature),
        };

        let response = (|| async { self.send_once(&request).await })
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
                    "Completion request failed, retrying"
                );
            })
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocsiftError::llm("Completion response had no choices"))?
            .message
            .content;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!(
            model = %self.config.model,
            total_tokens = usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "Completion received"
        );

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
