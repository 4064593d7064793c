//! Word document extraction using docx-rs.

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;
use async_trait::async_trait;
use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableCellContent, TableChild, TableRowChild};

/// Characters per estimated page; .docx carries no reliable page count.
const CHARS_PER_PAGE: usize = 2000;

/// Word (.docx) extractor.
///
/// Walks paragraphs, hyperlinks, and tables. Headings (paragraph styles
/// starting with `heading` or containing `title`) are also collected into
/// metadata.
#[derive(Debug, Clone)]
pub struct DocxExtractor {
    /// Render tables as `a | b` rows instead of loose cell lines.
    preserve_tables: bool,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct WordText {
    blocks: Vec<String>,
    headings: Vec<String>,
    tables: usize,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self {
            preserve_tables: true,
        }
    }

    /// Configure whether to preserve table structure.
    pub fn with_tables(mut self, preserve: bool) -> Self {
        self.preserve_tables = preserve;
        self
    }

    fn extract_sync(content: Vec<u8>, preserve_tables: bool) -> ExtractResult<WordText> {
        let docx = docx_rs::read_docx(&content)
            .map_err(|e| ExtractError::Docx(format!("Failed to parse DOCX: {}", e)))?;

        let mut out = WordText::default();
        for child in docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => {
                    let text = paragraph_text(&p);
                    if text.trim().is_empty() {
                        continue;
                    }
                    let is_heading = p.property.style.as_ref().is_some_and(|s| {
                        let id = s.val.to_lowercase();
                        id.starts_with("heading") || id.contains("title")
                    });
                    if is_heading {
                        out.headings.push(text.trim().to_string());
                    }
                    out.blocks.push(text);
                }
                DocumentChild::Table(t) => {
                    out.tables += 1;
                    let rows = table_rows(&t);
                    if preserve_tables {
                        let rendered = rows
                            .iter()
                            .map(|row| row.join(" | "))
                            .collect::<Vec<_>>()
                            .join("\n");
                        if !rendered.trim().is_empty() {
                            out.blocks.push(rendered);
                        }
                    } else {
                        out.blocks.extend(rows.into_iter().flatten().filter(|c| !c.is_empty()));
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }
}

fn paragraph_text(p: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        match child {
            ParagraphChild::Run(r) => push_run(&mut text, r),
            ParagraphChild::Hyperlink(h) => {
                for inner in &h.children {
                    if let ParagraphChild::Run(r) = inner {
                        push_run(&mut text, r);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(text: &mut String, run: &docx_rs::Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn table_rows(t: &docx_rs::Table) -> Vec<Vec<String>> {
    t.rows
        .iter()
        .map(|row| {
            let TableChild::TableRow(r) = row;
            r.cells
                .iter()
                .map(|cell| {
                    let TableRowChild::TableCell(c) = cell;
                    c.children
                        .iter()
                        .filter_map(|content| match content {
                            TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                            _ => None,
                        })
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string()
                })
                .collect()
        })
        .collect()
}

/// Estimated page count for `text`, at least 1.
pub fn estimate_pages(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_PAGE).max(1)
}

#[async_trait]
impl Extractor for DocxExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let path = locator.as_path().ok_or_else(|| {
            ExtractError::UnsupportedFormat(format!("Word extraction needs a file path: {}", locator))
        })?;
        let content = tokio::fs::read(path).await?;
        let content_len = content.len();
        let preserve_tables = self.preserve_tables;

        let word = tokio::task::spawn_blocking(move || Self::extract_sync(content, preserve_tables))
            .await??;

        let text = word.blocks.join("\n");
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        let pages = estimate_pages(&text);
        Ok(ExtractionResult::success(FormatKind::Word, text, pages)
            .with_metadata("file_size", content_len)
            .with_metadata("headings", word.headings)
            .with_metadata("tables", word.tables)
            .with_metadata("extraction_method", "docx-rs"))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &[FormatKind::Word]
    }

    fn name(&self) -> &str {
        "docx-rs"
    }
}
