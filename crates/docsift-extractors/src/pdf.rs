//! PDF content extraction using pdf-extract.

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;
use async_trait::async_trait;

/// PDF content extractor using pdf-extract library.
///
/// Reads the file, then runs the synchronous pdf-extract call inside
/// spawn_blocking to avoid blocking the async runtime.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    /// Minimum trimmed text length to consider extraction successful
    /// (image-only PDFs produce little or no text)
    min_text_length: usize,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor {
    /// Create new PDF extractor with default settings.
    pub fn new() -> Self {
        Self { min_text_length: 1 }
    }

    /// Create PDF extractor with custom minimum text threshold.
    pub fn with_min_text_length(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    fn extract_sync(content: Vec<u8>) -> ExtractResult<(String, usize)> {
        let text = pdf_extract::extract_text_from_mem(&content)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        Ok((text, count_pages(&content)))
    }
}

/// Count page objects in raw PDF bytes (`/Type /Page`, not `/Pages`), at least 1.
fn count_pages(content: &[u8]) -> usize {
    let mut pages = 0;
    for needle in [&b"/Type /Page"[..], &b"/Type/Page"[..]] {
        let mut start = 0;
        while let Some(pos) = find(&content[start..], needle) {
            let end = start + pos + needle.len();
            if content.get(end) != Some(&b's') {
                pages += 1;
            }
            start = end;
        }
    }
    pages.max(1)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let path = locator.as_path().ok_or_else(|| {
            ExtractError::UnsupportedFormat(format!("PDF extraction needs a file path: {}", locator))
        })?;
        let content = tokio::fs::read(path).await?;
        let content_len = content.len();

        let (text, pages) =
            tokio::task::spawn_blocking(move || Self::extract_sync(content)).await??;

        if text.trim().chars().count() < self.min_text_length {
            return Err(ExtractError::EmptyContent);
        }

        Ok(ExtractionResult::success(FormatKind::Pdf, text, pages)
            .with_metadata("file_size", content_len)
            .with_metadata("extraction_method", "pdf-extract"))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &[FormatKind::Pdf]
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_count_pages_skips_pages_tree() {
        let raw = b"<< /Type /Pages /Kids [3 0 R 4 0 R] >> << /Type /Page >> << /Type/Page >>";
        assert_eq!(count_pages(raw), 2);
        assert_eq!(count_pages(b"no pages here"), 1);
    }

    #[test]
    fn test_pdf_extractor_creation() {
        let extractor = PdfExtractor::new();
        assert_eq!(extractor.name(), "pdf-extract");
        assert!(extractor.supports(FormatKind::Pdf));
        assert!(!extractor.supports(FormatKind::Word));
        assert_eq!(PdfExtractor::with_min_text_length(10).min_text_length, 10);
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_cleanly() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"this is not a pdf at all").unwrap();

        let result = PdfExtractor::new()
            .run(&Locator::Path(file.path().to_path_buf()))
            .await;

        assert!(!result.success);
        assert!(result.text.is_empty());
        assert!(!result.error.unwrap().is_empty());
    }
}
