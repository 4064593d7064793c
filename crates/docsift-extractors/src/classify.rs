//! Turns raw extractor error text into user-facing messages.
//!
//! Classification is substring matching against whatever the underlying
//! library or script printed. It is lossy and non-exhaustive: unknown
//! messages fall through to a generic `"<Format> extraction failed: ..."`
//! string with the raw text preserved.

use crate::error::ExtractError;
use crate::types::{ExtractionResult, FormatKind};

pub const PDF_PROTECTED: &str =
    "This PDF is password-protected and cannot be processed. Please use an unprotected PDF file.";
pub const PDF_INVALID: &str =
    "This file is not a valid PDF or is corrupted. Please try a different PDF file.";
pub const PDF_PERMISSION: &str = "Unable to access the PDF file. Please check file permissions.";
pub const PDF_NO_TEXT: &str =
    "No readable text found in PDF. The document may be scanned or image-based.";
pub const WORD_PROTECTED: &str =
    "This Word document is password-protected and cannot be processed. Please remove the password and try again.";
pub const WORD_INVALID: &str =
    "This file is not a valid Word document or is corrupted. Please try a different file.";

/// Map a raw error string to a human-readable message for `format`.
pub fn classify_failure(format: FormatKind, raw: &str) -> String {
    let lower = raw.to_lowercase();
    match format {
        FormatKind::Pdf => {
            if lower.contains("secured pdf")
                || lower.contains("encrypted")
                || lower.contains("password")
            {
                return PDF_PROTECTED.to_string();
            }
            if lower.contains("invalid pdf") || lower.contains("not a pdf") || lower.contains("corrupt")
            {
                return PDF_INVALID.to_string();
            }
            if lower.contains("permission denied") {
                return PDF_PERMISSION.to_string();
            }
        }
        FormatKind::Word => {
            if lower.contains("password") || lower.contains("encrypted") {
                return WORD_PROTECTED.to_string();
            }
            if lower.contains("invalid zip") || lower.contains("corrupt") {
                return WORD_INVALID.to_string();
            }
        }
        _ => {}
    }
    format!("{} extraction failed: {}", format.label(), raw)
}

/// Fold an extraction error into the uniform failure record.
pub fn failure_from_error(format: FormatKind, err: &ExtractError) -> ExtractionResult {
    let message = match err {
        ExtractError::UnsupportedFormat(_)
        | ExtractError::NotFound(_)
        | ExtractError::Timeout(_) => err.to_string(),
        ExtractError::MalformedOutput(_) => {
            format!("{} processing failed: {}", format.label(), err)
        }
        ExtractError::EmptyContent if format == FormatKind::Pdf => PDF_NO_TEXT.to_string(),
        ExtractError::EmptyContent => {
            format!("No readable text found in {} content", format.label())
        }
        _ => classify_failure(format, &err.to_string()),
    };
    ExtractionResult::failure(format, err.kind(), message)
}
