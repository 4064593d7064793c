//! docsift-embeddings - Embedding provider implementations for docsift.
//!
//! # Supported Providers
//!
//! - **OpenAI** - text-embedding-ada-002, text-embedding-3-small, etc.
//! - **Ollama** - local embedding models through Ollama's OpenAI-compatible API
//!
//! Batches go out as a single request and come back in input order.
//!
//! # Example
//!
//! ```ignore
//! use docsift_embeddings::EmbedderFactory;
//!
//! let embedder = EmbedderFactory::openai()?;
//! let local = EmbedderFactory::ollama_with_model("nomic-embed-text", 768)?;
//! ```

mod factory;
mod openai;

pub use factory::EmbedderFactory;
pub use openai::OpenAIEmbedder;

// Re-export core types for convenience
pub use docsift_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
