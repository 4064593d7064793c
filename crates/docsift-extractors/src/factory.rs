//! Factory for creating extractors.

use std::sync::Arc;

use crate::config::ExtractionConfig;
use crate::placeholder::PlaceholderExtractor;
use crate::process::ProcessExtractor;
use crate::text::TextExtractor;
use crate::types::FormatKind;
use crate::youtube::YoutubeExtractor;
use crate::Extractor;

#[cfg(feature = "pdf")]
use crate::PdfExtractor;

#[cfg(feature = "docx")]
use crate::DocxExtractor;

#[cfg(feature = "office")]
use crate::OfficeExtractor;

/// Factory for creating content extractors.
pub struct ExtractorFactory;

impl ExtractorFactory {
    /// Create a PDF extractor.
    #[cfg(feature = "pdf")]
    pub fn pdf() -> Arc<dyn Extractor> {
        Arc::new(PdfExtractor::new())
    }

    /// Create a Word extractor.
    #[cfg(feature = "docx")]
    pub fn docx() -> Arc<dyn Extractor> {
        Arc::new(DocxExtractor::new())
    }

    /// Create an Excel workbook extractor.
    #[cfg(feature = "office")]
    pub fn spreadsheet() -> Arc<dyn Extractor> {
        Arc::new(OfficeExtractor::spreadsheet())
    }

    /// Create a PowerPoint deck extractor.
    #[cfg(feature = "office")]
    pub fn presentation() -> Arc<dyn Extractor> {
        Arc::new(OfficeExtractor::presentation())
    }

    /// Create the in-process plain-text extractor.
    pub fn text() -> Arc<dyn Extractor> {
        Arc::new(TextExtractor::new())
    }

    /// Create a placeholder extractor for a format without a real backend.
    pub fn placeholder(format: FormatKind) -> Arc<dyn Extractor> {
        Arc::new(PlaceholderExtractor::for_format(format))
    }

    /// Create a YouTube extractor, using the configured caption script if any.
    pub fn youtube(config: &ExtractionConfig) -> Arc<dyn Extractor> {
        match config.script_for(FormatKind::Youtube) {
            Some(script) => Arc::new(YoutubeExtractor::with_caption_script(
                ProcessExtractor::new(
                    "youtube-captions",
                    &config.interpreter,
                    script,
                    vec![FormatKind::Youtube],
                )
                .with_timeout(config.timeout_for(FormatKind::Youtube)),
            )),
            None => Arc::new(YoutubeExtractor::new()),
        }
    }

    /// Create a script-backed extractor for `format`.
    pub fn process(config: &ExtractionConfig, format: FormatKind) -> Option<Arc<dyn Extractor>> {
        let script = config.script_for(format)?;
        let extractor = ProcessExtractor::new(
            format!("script-{}", format),
            &config.interpreter,
            script,
            vec![format],
        )
        .with_timeout(config.timeout_for(format));
        Some(Arc::new(extractor))
    }

    /// All extractors for a configuration, in dispatch priority order.
    ///
    /// Configured scripts come first so they take over their format from
    /// the in-process extractor.
    pub fn from_config(config: &ExtractionConfig) -> Vec<Arc<dyn Extractor>> {
        let mut extractors: Vec<Arc<dyn Extractor>> = [
            FormatKind::Text,
            FormatKind::Excel,
            FormatKind::PowerPoint,
        ]
        .into_iter()
        .filter_map(|format| Self::process(config, format))
        .collect();

        #[cfg(feature = "pdf")]
        extractors.push(Self::pdf());

        #[cfg(feature = "docx")]
        extractors.push(Self::docx());

        #[cfg(feature = "office")]
        {
            extractors.push(Self::spreadsheet());
            extractors.push(Self::presentation());
        }

        extractors.push(Self::text());
        extractors.push(Self::youtube(config));
        for format in [
            FormatKind::Image,
            FormatKind::Audio,
            FormatKind::Video,
            FormatKind::Web,
        ] {
            extractors.push(Self::placeholder(format));
        }

        extractors
    }

    /// All extractors with default configuration.
    pub fn all() -> Vec<Arc<dyn Extractor>> {
        Self::from_config(&ExtractionConfig::default())
    }
}
