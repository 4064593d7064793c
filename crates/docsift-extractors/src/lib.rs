//! docsift-extractors - Format extractors and the extraction dispatcher.
//!
//! Turns a file path or URL into plain text plus counts and metadata with a
//! unified trait-based interface. Every outcome, including failure, is an
//! [`ExtractionResult`] record.
//!
//! # Features
//!
//! - `pdf` (default) - PDF text extraction via pdf-extract
//! - `docx` (default) - Word text extraction via docx-rs
//! - `office` (default) - Excel and PowerPoint extraction via zip + quick-xml
//! - `full` - All extraction features
//!
//! # Example
//!
//! ```ignore
//! use docsift_extractors::{Dispatcher, Locator};
//!
//! let dispatcher = Dispatcher::with_defaults();
//! let result = dispatcher.extract(&Locator::parse("notes.txt"), None).await;
//! println!("{} words", result.word_count);
//! ```

mod classify;
mod config;
mod dispatcher;
mod error;
mod factory;
mod placeholder;
mod process;
mod text;
mod types;
mod youtube;

#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "docx")]
mod docx;

#[cfg(feature = "office")]
mod office;

pub use classify::{classify_failure, failure_from_error};
pub use config::{ExtractionConfig, ScriptConfig};
pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, ExtractError, ExtractResult};
pub use factory::ExtractorFactory;
pub use placeholder::PlaceholderExtractor;
pub use process::{ProcessExtractor, DEFAULT_PROCESS_TIMEOUT};
pub use text::{character_count, decode_text, line_count, word_count, TextExtractor};
pub use types::{ExtractionResult, FormatKind, Locator, TimeoutClass};
pub use youtube::{parse_video_id, watch_url, YoutubeExtractor};

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

#[cfg(feature = "docx")]
pub use docx::{estimate_pages, DocxExtractor};

#[cfg(feature = "office")]
pub use office::{extract_deck, extract_workbook, OfficeExtractor};

use async_trait::async_trait;

/// Core Extractor trait - all format extractors implement this.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract text from the content at `locator`.
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult>;

    /// Formats this extractor handles.
    fn supported_formats(&self) -> &[FormatKind];

    /// Check if this extractor handles the given format.
    fn supports(&self, format: FormatKind) -> bool {
        self.supported_formats().contains(&format)
    }

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;

    /// Whether output is canned placeholder text rather than real content.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Format reported on results that carry no format of their own.
    fn primary_format(&self) -> FormatKind {
        self.supported_formats()
            .first()
            .copied()
            .unwrap_or(FormatKind::Text)
    }

    /// Extract and fold any error into a failed [`ExtractionResult`].
    async fn run(&self, locator: &Locator) -> ExtractionResult {
        match self.extract(locator).await {
            Ok(result) => result.normalized(),
            Err(e) => failure_from_error(self.primary_format(), &e),
        }
    }
}
