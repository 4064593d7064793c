//! Extraction configuration: timeouts and external extractor scripts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{FormatKind, TimeoutClass};

/// External scripts that take over a format from the in-process extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Plain-text extractor script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<PathBuf>,
    /// Excel extractor script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excel: Option<PathBuf>,
    /// PowerPoint extractor script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub powerpoint: Option<PathBuf>,
    /// YouTube caption script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<PathBuf>,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timeout for PDF, Word, Excel, and PowerPoint.
    pub document_timeout_secs: u64,
    /// Timeout for plain text.
    pub text_timeout_secs: u64,
    /// Timeout for images, audio, video, web pages, and YouTube.
    pub media_timeout_secs: u64,
    /// Interpreter used to run external scripts.
    pub interpreter: PathBuf,
    /// Per-format external scripts.
    pub scripts: ScriptConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            document_timeout_secs: 300,
            text_timeout_secs: 60,
            media_timeout_secs: 120,
            interpreter: PathBuf::from("python3"),
            scripts: ScriptConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Time budget for a format.
    pub fn timeout_for(&self, format: FormatKind) -> Duration {
        let secs = match format.timeout_class() {
            TimeoutClass::Document => self.document_timeout_secs,
            TimeoutClass::Text => self.text_timeout_secs,
            TimeoutClass::Media => self.media_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    /// Configured script for a format, if any.
    pub fn script_for(&self, format: FormatKind) -> Option<&PathBuf> {
        match format {
            FormatKind::Text => self.scripts.text.as_ref(),
            FormatKind::Excel => self.scripts.excel.as_ref(),
            FormatKind::PowerPoint => self.scripts.powerpoint.as_ref(),
            FormatKind::Youtube => self.scripts.youtube.as_ref(),
            _ => None,
        }
    }
}
