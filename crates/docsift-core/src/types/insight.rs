//! Insight generator inputs and result records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

/// How much detail a summary should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SummaryMode {
    #[default]
    Detailed,
    Brief,
}

/// Caller options for [`summarize`](crate::InsightGenerator::summarize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    pub mode: SummaryMode,
    /// Output language code.
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            mode: SummaryMode::Detailed,
            language: "en".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl SummaryOptions {
    /// Read options out of a job's free-form option map.
    ///
    /// Unknown keys are ignored. Each malformed value falls back to its own
    /// default without affecting the others.
    pub fn from_job_options(options: &HashMap<String, serde_json::Value>) -> Self {
        fn field<T: DeserializeOwned>(
            options: &HashMap<String, serde_json::Value>,
            key: &str,
        ) -> Option<T> {
            options
                .get(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        let defaults = Self::default();
        Self {
            mode: field(options, "mode").unwrap_or(defaults.mode),
            language: field(options, "language").unwrap_or(defaults.language),
            max_tokens: field(options, "max_tokens"),
            temperature: field(options, "temperature"),
        }
    }
}

/// Outcome of a summarize call. Never an error: failures set `success=false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub success: bool,
    /// Summary text, or the fallback message when the call failed.
    pub insights: String,
    pub model_used: String,
    pub tokens_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f32>,
    pub processing_time_ms: u64,
    /// Remote error body when the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a single-text embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub success: bool,
    pub vector: Vec<f32>,
    /// Served from the cache without a remote call.
    pub cached: bool,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmbeddingResult {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Outcome of a batch embedding. All vectors or none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEmbeddingResult {
    pub success: bool,
    /// One vector per input, in input order.
    pub vectors: Vec<Vec<f32>>,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
