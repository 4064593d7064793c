//! Extraction dispatcher: routes a locator to the extractor for its format.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::classify::failure_from_error;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

/// Routes content to registered extractors by format.
///
/// Registration order is priority order: the first extractor supporting a
/// format handles it. Every call returns an [`ExtractionResult`]; extractor
/// errors, missing files, and timeouts come back as failed results.
pub struct Dispatcher {
    extractors: Vec<Arc<dyn Extractor>>,
    config: ExtractionConfig,
}

impl Dispatcher {
    /// Create a dispatcher with no extractors.
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            extractors: Vec::new(),
            config,
        }
    }

    /// Create a dispatcher with every built-in extractor and default timeouts.
    pub fn with_defaults() -> Self {
        Self::from_config(ExtractionConfig::default())
    }

    /// Create a dispatcher with every built-in extractor for `config`.
    pub fn from_config(config: ExtractionConfig) -> Self {
        Self {
            extractors: crate::ExtractorFactory::from_config(&config),
            config,
        }
    }

    /// Register an extractor after the existing ones.
    pub fn add_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// The extractor that would handle `format`.
    pub fn extractor_for(&self, format: FormatKind) -> Option<&Arc<dyn Extractor>> {
        self.extractors.iter().find(|e| e.supports(format))
    }

    /// Check if any extractor handles `format`.
    pub fn supports(&self, format: FormatKind) -> bool {
        self.extractor_for(format).is_some()
    }

    /// Formats covered by at least one extractor, without duplicates.
    pub fn supported_formats(&self) -> Vec<FormatKind> {
        let mut formats: Vec<FormatKind> = Vec::new();
        for format in self.extractors.iter().flat_map(|e| e.supported_formats()) {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
        formats
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Get the number of registered extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if the dispatcher has no registered extractors.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Extract text from `locator`.
    ///
    /// `declared` overrides format detection. The extractor runs under the
    /// timeout configured for the resolved format.
    pub async fn extract(
        &self,
        locator: &Locator,
        declared: Option<FormatKind>,
    ) -> ExtractionResult {
        let started = Instant::now();

        let Some(format) = declared.or_else(|| FormatKind::detect(locator)) else {
            warn!(locator = %locator, "Cannot determine content format");
            return ExtractionResult::unsupported(
                ExtractError::UnsupportedFormat(format!("cannot determine format of {}", locator))
                    .to_string(),
            );
        };

        let Some(extractor) = self.extractor_for(format) else {
            warn!(locator = %locator, format = %format, "No extractor registered");
            return failure_from_error(
                format,
                &ExtractError::UnsupportedFormat(format!("no extractor registered for {}", format)),
            );
        };

        let mut file_meta = None;
        if let Some(path) = locator.as_path() {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() => file_meta = Some(meta),
                _ => {
                    warn!(locator = %locator, format = %format, "File not found");
                    return failure_from_error(
                        format,
                        &ExtractError::NotFound(path.display().to_string()),
                    );
                }
            }
        }

        let timeout = self.config.timeout_for(format);
        debug!(
            locator = %locator,
            format = %format,
            extractor = extractor.name(),
            timeout_secs = timeout.as_secs(),
            "Dispatching extraction"
        );

        let mut result = match tokio::time::timeout(timeout, extractor.run(locator)).await {
            Ok(result) => result,
            Err(_) => failure_from_error(format, &ExtractError::Timeout(timeout)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        result.format_kind = Some(format);
        result
            .metadata
            .insert("extractor".into(), extractor.name().into());
        result.metadata.insert("format".into(), format.to_string().into());
        result
            .metadata
            .insert("processing_time_ms".into(), elapsed_ms.into());
        if let Some(meta) = file_meta {
            result
                .metadata
                .entry("file_size".into())
                .or_insert_with(|| meta.len().into());
            if let Ok(modified) = meta.modified() {
                let modified: DateTime<Utc> = modified.into();
                result
                    .metadata
                    .insert("modified".into(), modified.to_rfc3339().into());
            }
        }

        if result.success {
            info!(
                locator = %locator,
                format = %format,
                extractor = extractor.name(),
                words = result.word_count,
                units = result.unit_count,
                elapsed_ms,
                "Extraction completed"
            );
        } else {
            warn!(
                locator = %locator,
                format = %format,
                extractor = extractor.name(),
                error = result.error.as_deref().unwrap_or_default(),
                elapsed_ms,
                "Extraction failed"
            );
        }

        result
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ExtractResult};
    use async_trait::async_trait;
    use std::io::Write;
    use std::time::Duration;

    struct SlowExtractor;

    #[async_trait]
    impl Extractor for SlowExtractor {
        async fn extract(&self, _locator: &Locator) -> ExtractResult<ExtractionResult> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ExtractionResult::success(FormatKind::Web, "late", 1))
        }

        fn supported_formats(&self) -> &[FormatKind] {
            &[FormatKind::Web]
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Reports counts that disagree with its text.
    struct SloppyExtractor;

    #[async_trait]
    impl Extractor for SloppyExtractor {
        async fn extract(&self, _locator: &Locator) -> ExtractResult<ExtractionResult> {
            let mut result = ExtractionResult::success(FormatKind::Web, "one two three", 1);
            result.word_count = 99;
            result.character_count = 1;
            Ok(result)
        }

        fn supported_formats(&self) -> &[FormatKind] {
            &[FormatKind::Web]
        }

        fn name(&self) -> &str {
            "sloppy"
        }
    }

    fn text_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_plain_text_counts() {
        let file = text_file("Hello world. Hello again.\n");
        let dispatcher = Dispatcher::with_defaults();

        let result = dispatcher
            .extract(&Locator::Path(file.path().to_path_buf()), None)
            .await;

        assert!(result.success);
        assert_eq!(result.word_count, 4);
        assert_eq!(result.character_count, 26);
        assert_eq!(result.format_kind, Some(FormatKind::Text));
        assert_eq!(result.metadata["extractor"], "text");
        assert_eq!(result.metadata["file_size"], 26);
        assert!(result.metadata.contains_key("modified"));
        assert!(result.is_consistent());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dispatcher = Dispatcher::with_defaults();
        let result = dispatcher
            .extract(&Locator::parse("/definitely/not/here.txt"), None)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ExtractionFailure));
        assert!(result.error.unwrap().contains("File not found"));
        assert!(result.text.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_extension_is_unsupported() {
        let dispatcher = Dispatcher::with_defaults();
        let result = dispatcher
            .extract(&Locator::parse("/tmp/archive.xyz"), None)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::UnsupportedFormat));
        assert_eq!(result.format_kind, None);
    }

    #[tokio::test]
    async fn test_no_registered_extractor() {
        let dispatcher = Dispatcher::new(ExtractionConfig::default());
        let result = dispatcher
            .extract(&Locator::parse("https://example.com"), None)
            .await;

        assert_eq!(result.error_kind, Some(ErrorKind::UnsupportedFormat));
        assert_eq!(result.format_kind, Some(FormatKind::Web));
    }

    #[tokio::test]
    async fn test_declared_format_overrides_detection() {
        let file = text_file("declared as text");
        let path = file.path().with_extension("bin");
        std::fs::copy(file.path(), &path).unwrap();

        let dispatcher = Dispatcher::with_defaults();
        let result = dispatcher
            .extract(&Locator::Path(path.clone()), Some(FormatKind::Text))
            .await;
        std::fs::remove_file(&path).unwrap();

        assert!(result.success);
        assert_eq!(result.text, "declared as text");
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let config = ExtractionConfig {
            media_timeout_secs: 0,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(config).add_extractor(Arc::new(SlowExtractor));

        let result = dispatcher
            .extract(&Locator::parse("https://example.com/page"), None)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_counts_recomputed_from_text() {
        let dispatcher =
            Dispatcher::new(ExtractionConfig::default()).add_extractor(Arc::new(SloppyExtractor));

        let result = dispatcher
            .extract(&Locator::parse("https://example.com"), None)
            .await;

        assert!(result.success);
        assert_eq!(result.word_count, 3);
        assert_eq!(result.character_count, 13);
    }

    #[tokio::test]
    async fn test_first_registered_extractor_wins() {
        let dispatcher = Dispatcher::new(ExtractionConfig::default())
            .add_extractor(Arc::new(SloppyExtractor))
            .add_extractor(Arc::new(SlowExtractor));

        assert_eq!(dispatcher.extractor_for(FormatKind::Web).unwrap().name(), "sloppy");
        assert_eq!(dispatcher.supported_formats(), vec![FormatKind::Web]);
        assert_eq!(dispatcher.len(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_formats_report_mock() {
        let dispatcher = Dispatcher::with_defaults();
        let result = dispatcher
            .extract(&Locator::parse("https://example.com/article"), None)
            .await;

        assert!(result.success);
        assert!(result.is_mock());
        assert_eq!(result.format_kind, Some(FormatKind::Web));
    }
}
