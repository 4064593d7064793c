//! Core types for content extraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::ErrorKind;
use crate::text::{character_count, word_count};

/// Kind of content a locator refers to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Pdf,
    Word,
    Excel,
    #[strum(to_string = "powerpoint", serialize = "power_point")]
    #[serde(rename = "powerpoint")]
    PowerPoint,
    Text,
    Image,
    Audio,
    Video,
    Web,
    Youtube,
}

/// Timeout bucket a format falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// Office documents and PDFs.
    Document,
    /// Plain text.
    Text,
    /// Media transcription and remote fetches.
    Media,
}

impl FormatKind {
    /// Resolve a format from a file extension (case-insensitive, leading dot optional).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let kind = match ext.as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Word,
            "xls" | "xlsx" | "xlsm" => Self::Excel,
            "ppt" | "pptx" => Self::PowerPoint,
            "txt" | "text" | "md" | "csv" | "log" => Self::Text,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" => Self::Image,
            "mp3" | "wav" | "m4a" | "ogg" | "flac" | "aac" => Self::Audio,
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "wmv" => Self::Video,
            "html" | "htm" => Self::Web,
            _ => return None,
        };
        Some(kind)
    }

    /// Resolve a format from a MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let kind = match mime.as_str() {
            "application/pdf" => Self::Pdf,
            "application/msword"
            | "application/docx"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::Word
            }
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Self::Excel,
            "application/vnd.ms-powerpoint"
            | "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Self::PowerPoint
            }
            "text/html" => Self::Web,
            m if m.starts_with("text/") => Self::Text,
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("audio/") => Self::Audio,
            m if m.starts_with("video/") => Self::Video,
            _ => return None,
        };
        Some(kind)
    }

    /// Resolve a caller-declared format given as a name, MIME type, or extension.
    pub fn parse_declared(declared: &str) -> Option<Self> {
        let declared = declared.trim();
        if declared.is_empty() {
            return None;
        }
        Self::from_str(declared)
            .ok()
            .or_else(|| Self::from_mime(declared))
            .or_else(|| Self::from_extension(declared))
    }

    /// Sniff the format of a locator.
    pub fn detect(locator: &Locator) -> Option<Self> {
        match locator {
            Locator::Url(url) => {
                let lower = url.to_ascii_lowercase();
                if lower.contains("youtube.com") || lower.contains("youtu.be") {
                    Some(Self::Youtube)
                } else {
                    Some(Self::Web)
                }
            }
            Locator::Path(path) => path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Self::from_extension),
        }
    }

    /// Human-readable format name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "Word",
            Self::Excel => "Excel",
            Self::PowerPoint => "PowerPoint",
            Self::Text => "TXT",
            Self::Image => "Image",
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Web => "Web page",
            Self::Youtube => "YouTube",
        }
    }

    /// What `unit_count` counts for this format.
    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Pdf | Self::Word | Self::Web => "pages",
            Self::Excel => "sheets",
            Self::PowerPoint => "slides",
            Self::Text => "lines",
            Self::Image => "images",
            Self::Audio | Self::Video | Self::Youtube => "segments",
        }
    }

    /// Timeout bucket for this format.
    pub fn timeout_class(&self) -> TimeoutClass {
        match self {
            Self::Pdf | Self::Word | Self::Excel | Self::PowerPoint => TimeoutClass::Document,
            Self::Text => TimeoutClass::Text,
            Self::Image | Self::Audio | Self::Video | Self::Web | Self::Youtube => {
                TimeoutClass::Media
            }
        }
    }
}

/// A file path or URL identifying content to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Local file.
    Path(PathBuf),
    /// Remote resource.
    Url(String),
}

impl Locator {
    /// Parse a raw locator string. `http(s)://` prefixes are URLs; everything else is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// The path, if this is a local file.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p.as_path()),
            Self::Url(_) => None,
        }
    }

    /// Whether this is a remote URL.
    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Normalized output of every extractor.
///
/// A failed result always has empty `text`, zero counts, and a non-empty
/// `error`. A successful result has no `error`, and its counts describe
/// `text`. Build through [`ExtractionResult::success`] and
/// [`ExtractionResult::failure`] to keep those properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub text: String,
    /// Structural units found (pages, sheets, slides, lines).
    pub unit_count: usize,
    /// Resolved format; absent only when the format could not be resolved.
    pub format_kind: Option<FormatKind>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    pub word_count: usize,
    pub character_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ExtractionResult {
    /// Successful extraction; counts are derived from `text`.
    pub fn success(format_kind: FormatKind, text: impl Into<String>, unit_count: usize) -> Self {
        let text = text.into();
        Self {
            success: true,
            word_count: word_count(&text),
            character_count: character_count(&text),
            text,
            unit_count,
            format_kind: Some(format_kind),
            metadata: HashMap::new(),
            error: None,
            error_kind: None,
        }
    }

    /// Failed extraction.
    pub fn failure(format_kind: FormatKind, kind: ErrorKind, error: impl Into<String>) -> Self {
        Self::failed(Some(format_kind), kind, error.into())
    }

    /// Failure for a locator whose format could not be resolved.
    pub fn unsupported(error: impl Into<String>) -> Self {
        Self::failed(None, ErrorKind::UnsupportedFormat, error.into())
    }

    fn failed(format_kind: Option<FormatKind>, kind: ErrorKind, mut error: String) -> Self {
        if error.trim().is_empty() {
            error = format!("{} extraction failed", label(format_kind));
        }
        Self {
            success: false,
            text: String::new(),
            unit_count: 0,
            format_kind,
            metadata: HashMap::new(),
            word_count: 0,
            character_count: 0,
            error: Some(error),
            error_kind: Some(kind),
        }
    }

    /// Add metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Re-derive counts from `text`, turning a blank success into a failure.
    pub fn normalized(self) -> Self {
        if !self.success {
            let Self {
                format_kind,
                error,
                error_kind,
                metadata,
                ..
            } = self;
            let mut failed = Self::failed(
                format_kind,
                error_kind.unwrap_or(ErrorKind::ExtractionFailure),
                error.unwrap_or_default(),
            );
            failed.metadata = metadata;
            return failed;
        }
        if self.text.trim().is_empty() {
            let mut failed = Self::failed(
                self.format_kind,
                ErrorKind::ExtractionFailure,
                format!("No readable text found in {} content", label(self.format_kind)),
            );
            failed.metadata = self.metadata;
            return failed;
        }
        Self {
            word_count: word_count(&self.text),
            character_count: character_count(&self.text),
            error: None,
            error_kind: None,
            ..self
        }
    }

    /// Check the success/failure invariants.
    pub fn is_consistent(&self) -> bool {
        if self.success {
            self.error.is_none()
                && self.word_count == word_count(&self.text)
                && self.character_count == character_count(&self.text)
        } else {
            self.text.is_empty() && self.error.as_deref().is_some_and(|e| !e.is_empty())
        }
    }

    /// Unit label for the resolved format.
    pub fn unit_label(&self) -> &'static str {
        self.format_kind.map(|f| f.unit_label()).unwrap_or("units")
    }

    /// Whether this result came from a placeholder extractor.
    pub fn is_mock(&self) -> bool {
        self.metadata
            .get("mock")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

fn label(format_kind: Option<FormatKind>) -> &'static str {
    format_kind.map(|f| f.label()).unwrap_or("Content")
}
