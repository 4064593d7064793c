//! Summaries and embeddings over extracted text.

mod generator;
mod truncate;

pub use generator::InsightGenerator;
pub use truncate::{truncate_text, CHARS_PER_TOKEN};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message returned in place of a summary when the completion call fails.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I was unable to process your request after multiple attempts. Please try again later.";

/// Insight generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Token budget for summary input.
    pub summary_max_tokens: usize,
    /// Token budget for embedding input.
    pub embedding_max_tokens: usize,
    /// How long cached embeddings stay readable.
    pub embedding_cache_ttl_secs: u64,
    /// Cache key prefix for embeddings.
    pub cache_prefix: String,
    /// Confidence reported on successful summaries.
    pub confidence_score: f32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            summary_max_tokens: 12_000,
            embedding_max_tokens: 8_000,
            embedding_cache_ttl_secs: 86_400,
            cache_prefix: "embedding_".to_string(),
            confidence_score: 0.8,
        }
    }
}

impl InsightConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_cache_ttl_secs)
    }
}
