//! YouTube transcript extraction.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExtractError, ExtractResult};
use crate::placeholder::PlaceholderExtractor;
use crate::process::ProcessExtractor;
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

// watch?v=, embed/, v/, /<channel>/<x>/ and youtu.be/ forms
static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("video id pattern is valid")
});

/// Extract the 11-character video id from a YouTube URL.
pub fn parse_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Transcript extractor for YouTube links.
///
/// Runs a caption script when one is configured; otherwise returns a
/// placeholder transcript tagged as mock output.
#[derive(Debug, Clone, Default)]
pub struct YoutubeExtractor {
    captions: Option<ProcessExtractor>,
}

impl YoutubeExtractor {
    /// Extractor without a caption backend.
    pub fn new() -> Self {
        Self { captions: None }
    }

    /// Extractor that fetches captions through an external script.
    pub fn with_caption_script(captions: ProcessExtractor) -> Self {
        Self {
            captions: Some(captions),
        }
    }
}

#[async_trait]
impl Extractor for YoutubeExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let url = match locator {
            Locator::Url(url) => url,
            Locator::Path(_) => {
                return Err(ExtractError::UnsupportedFormat(format!(
                    "YouTube extraction needs a URL: {}",
                    locator
                )))
            }
        };
        let video_id = parse_video_id(url)
            .ok_or_else(|| ExtractError::ExtractionFailed(format!("Invalid YouTube URL: {}", url)))?;

        let result = match &self.captions {
            Some(captions) => captions
                .invoke(&watch_url(&video_id), FormatKind::Youtube)
                .await?,
            None => PlaceholderExtractor::mock_result(FormatKind::Youtube, &video_id),
        };
        Ok(result.with_metadata("video_id", video_id))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &[FormatKind::Youtube]
    }

    fn name(&self) -> &str {
        if self.captions.is_some() {
            "youtube-captions"
        } else {
            "mock-youtube-transcript"
        }
    }

    fn is_placeholder(&self) -> bool {
        self.captions.is_none()
    }
}
