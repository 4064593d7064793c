//! docsift-llm - Completion provider implementations for docsift.
//!
//! # Supported Providers
//!
//! - **OpenAI** - any OpenAI-compatible `/chat/completions` endpoint
//! - **Ollama** - local models through Ollama's OpenAI-compatible API
//!
//! Transient failures (timeouts, connection errors, 429 and 5xx) are retried
//! with exponential backoff. Everything else is returned to the caller with
//! the response body attached.
//!
//! # Example
//!
//! ```ignore
//! use docsift_llm::LlmFactory;
//!
//! let llm = LlmFactory::openai_with_model("gpt-4o-mini")?;
//! let local = LlmFactory::ollama_with_model("llama3.2")?;
//! ```

mod factory;
mod ollama;
mod openai;

pub use factory::LlmFactory;
pub use ollama::OllamaLlm;
pub use openai::OpenAIProvider;

// Re-export core types for convenience
pub use docsift_core::config::LlmProvider;
pub use docsift_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
