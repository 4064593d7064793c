//! Plain-text extraction and the counting functions shared by every extractor.

use async_trait::async_trait;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of characters (Unicode scalar values) in `text`.
pub fn character_count(text: &str) -> usize {
    text.chars().count()
}

/// Number of lines, counting a trailing newline as opening an empty last line.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// Decode raw bytes, returning the text and the encoding that was used.
///
/// UTF-8 (with or without BOM) is tried first, then UTF-16 when a BOM is
/// present, then Latin-1, which accepts any byte sequence.
pub fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        if let Ok(text) = std::str::from_utf8(rest) {
            return (text.to_string(), "utf-8-sig");
        }
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        if let Some(text) = decode_utf16(rest, u16::from_le_bytes) {
            return (text, "utf-16-le");
        }
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        if let Some(text) = decode_utf16(rest, u16::from_be_bytes) {
            return (text, "utf-16-be");
        }
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), "utf-8");
    }
    (bytes.iter().map(|&b| b as char).collect(), "latin-1")
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// In-process plain-text extractor.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let path = locator.as_path().ok_or_else(|| {
            ExtractError::UnsupportedFormat(format!("text extraction needs a file path: {}", locator))
        })?;
        let bytes = tokio::fs::read(path).await?;
        let file_size = bytes.len();
        let (text, encoding) = decode_text(&bytes);

        if text.trim().is_empty() {
            return Err(ExtractError::ExtractionFailed(
                "Could not extract text with any encoding".to_string(),
            ));
        }

        let lines = line_count(&text);
        Ok(ExtractionResult::success(FormatKind::Text, text, lines)
            .with_metadata("file_size", file_size)
            .with_metadata("encoding", encoding)
            .with_metadata("extraction_method", "native"))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &[FormatKind::Text]
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_counts() {
        let text = "Hello world. Hello again.\n";
        assert_eq!(word_count(text), 4);
        assert_eq!(character_count(text), 26);
        assert_eq!(line_count(text), 2);
        assert_eq!(word_count("  \t\n "), 0);
        assert_eq!(character_count("héllo"), 5);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let (text, encoding) = decode_text(b"\xEF\xBB\xBFabc");
        assert_eq!(text, "abc");
        assert_eq!(encoding, "utf-8-sig");
    }

    #[test]
    fn test_decode_utf16_le() {
        let (text, encoding) = decode_text(&[0xFF, 0xFE, b'h', 0, b'i', 0]);
        assert_eq!(text, "hi");
        assert_eq!(encoding, "utf-16-le");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        let (text, encoding) = decode_text(&[b'c', b'a', b'f', 0xE9]);
        assert_eq!(text, "café");
        assert_eq!(encoding, "latin-1");
    }

    #[tokio::test]
    async fn test_text_extractor_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Hello world. Hello again.\n").unwrap();

        let locator = Locator::Path(file.path().to_path_buf());
        let result = TextExtractor::new().extract(&locator).await.unwrap();

        assert!(result.success);
        assert_eq!(result.word_count, 4);
        assert_eq!(result.character_count, 26);
        assert_eq!(result.unit_count, 2);
        assert_eq!(result.metadata["encoding"], "utf-8");
    }

    #[tokio::test]
    async fn test_text_extractor_empty_file_fails() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let locator = Locator::Path(file.path().to_path_buf());
        let result = TextExtractor::new().run(&locator).await;

        assert!(!result.success);
        assert!(result.text.is_empty());
        assert!(result
            .error
            .unwrap()
            .contains("Could not extract text with any encoding"));
    }
}
