//! Extraction error types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Public failure taxonomy carried on a failed [`ExtractionResult`](crate::ExtractionResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No extractor is registered for the resolved format.
    UnsupportedFormat,
    /// The extractor ran but could not produce text.
    ExtractionFailure,
    /// The extractor exceeded its time budget.
    Timeout,
    /// An external process printed something other than a result document.
    MalformedExternalOutput,
}

/// Errors that can occur during content extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Format could not be resolved or has no extractor.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Locator does not point at an existing resource.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Extraction process failed.
    #[error("{0}")]
    ExtractionFailed(String),

    /// Extraction exceeded its time budget.
    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    /// External process exited with a non-zero status.
    #[error("Process exited with status {status}: {stderr}")]
    ProcessFailed { status: i32, stderr: String },

    /// External process output was not a valid result document.
    #[error("Invalid JSON response from external extractor: {0}")]
    MalformedOutput(String),

    /// Extracted content is empty.
    #[error("Empty content extracted")]
    EmptyContent,

    /// IO error during extraction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF-specific extraction error.
    #[cfg(feature = "pdf")]
    #[error("PDF extraction error: {0}")]
    Pdf(String),

    /// DOCX-specific extraction error.
    #[cfg(feature = "docx")]
    #[error("DOCX extraction error: {0}")]
    Docx(String),

    /// XLSX/PPTX container or XML error.
    #[cfg(feature = "office")]
    #[error("OOXML extraction error: {0}")]
    Ooxml(String),

    /// Task join error from spawn_blocking.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ExtractError {
    /// Project this error onto the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::MalformedOutput(_) => ErrorKind::MalformedExternalOutput,
            _ => ErrorKind::ExtractionFailure,
        }
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
