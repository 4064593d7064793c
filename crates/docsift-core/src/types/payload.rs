//! Externally visible result schema.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload handed to a [`ResultSink`](crate::ResultSink) for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResultPayload {
    pub user_id: String,
    pub tool_type: String,
    pub title: String,
    pub description: String,
    /// Snapshot of what was submitted.
    pub input_data: serde_json::Value,
    /// The produced summary, embedding flag, and extraction digest.
    pub result_data: serde_json::Value,
    pub metadata: serde_json::Value,
    pub status: String,
}

/// What the caller knows about the submitted content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMeta {
    pub user_id: String,
    /// Locator or a short label for inline text.
    pub source: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, serde_json::Value>,
}
