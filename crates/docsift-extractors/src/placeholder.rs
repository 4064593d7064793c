//! Stand-in extractors for formats without a real backend yet.
//!
//! OCR, transcription, and web scraping return deterministic text tagged
//! with `"mock": true` metadata. They satisfy the same [`Extractor`]
//! contract as real extractors, so swapping in a real implementation only
//! means registering a different extractor for the format.

use async_trait::async_trait;

use crate::error::ExtractResult;
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

/// Placeholder extractor for a single format.
#[derive(Debug, Clone)]
pub struct PlaceholderExtractor {
    formats: [FormatKind; 1],
    name: &'static str,
}

impl PlaceholderExtractor {
    /// Placeholder image OCR.
    pub fn ocr() -> Self {
        Self::for_format(FormatKind::Image)
    }

    /// Placeholder audio transcription.
    pub fn audio() -> Self {
        Self::for_format(FormatKind::Audio)
    }

    /// Placeholder video transcription.
    pub fn video() -> Self {
        Self::for_format(FormatKind::Video)
    }

    /// Placeholder web page scraping.
    pub fn web() -> Self {
        Self::for_format(FormatKind::Web)
    }

    /// Placeholder for an arbitrary format.
    pub fn for_format(format: FormatKind) -> Self {
        let name = match format {
            FormatKind::Image => "mock-ocr",
            FormatKind::Audio => "mock-audio-transcription",
            FormatKind::Video => "mock-video-transcription",
            FormatKind::Web => "mock-web-scraper",
            FormatKind::Youtube => "mock-youtube-transcript",
            _ => "mock-extractor",
        };
        Self {
            formats: [format],
            name,
        }
    }

    /// Deterministic text produced for `locator`.
    pub fn mock_text(format: FormatKind, locator: &str) -> String {
        match format {
            FormatKind::Image => format!("This is mock OCR text extracted from image: {}", locator),
            FormatKind::Audio => format!("This is mock transcription of audio file: {}", locator),
            FormatKind::Video => format!("This is mock transcription of video file: {}", locator),
            FormatKind::Web => format!("This is mock content scraped from web page: {}", locator),
            FormatKind::Youtube => {
                format!("This is mock transcript of YouTube video: {}", locator)
            }
            other => format!("This is mock {} content from: {}", other.label(), locator),
        }
    }

    /// Build the tagged placeholder result.
    pub fn mock_result(format: FormatKind, locator: &str) -> ExtractionResult {
        ExtractionResult::success(format, Self::mock_text(format, locator), 1)
            .with_metadata("mock", true)
            .with_metadata("extraction_method", "placeholder")
    }
}

#[async_trait]
impl Extractor for PlaceholderExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        Ok(Self::mock_result(self.formats[0], &locator.to_string()))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &self.formats
    }

    fn name(&self) -> &str {
        self.name
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ocr_placeholder_is_tagged() {
        let result = PlaceholderExtractor::ocr()
            .run(&Locator::parse("/uploads/scan.png"))
            .await;

        assert!(result.success);
        assert!(result.is_mock());
        assert_eq!(
            result.text,
            "This is mock OCR text extracted from image: /uploads/scan.png"
        );
        assert!(result.is_consistent());
    }

    #[tokio::test]
    async fn test_audio_placeholder() {
        let extractor = PlaceholderExtractor::audio();
        assert!(extractor.is_placeholder());
        assert!(extractor.supports(FormatKind::Audio));
        assert!(!extractor.supports(FormatKind::Video));

        let result = extractor.run(&Locator::parse("/uploads/talk.mp3")).await;
        assert_eq!(
            result.text,
            "This is mock transcription of audio file: /uploads/talk.mp3"
        );
    }
}
