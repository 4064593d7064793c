//! In-process Excel (.xlsx) and PowerPoint (.pptx) extraction.
//!
//! Both formats are ZIP containers of XML parts; entries are read with a
//! byte cap so a hostile archive cannot decompress without bound.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
const MAX_SHEETS: usize = 100;
const MAX_CELLS_PER_SHEET: usize = 100_000;

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

fn ooxml(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::Ooxml(e.to_string())
}

fn open_archive(bytes: &[u8]) -> ExtractResult<Archive<'_>> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(ooxml)
}

fn read_entry(archive: &mut Archive<'_>, name: &str) -> ExtractResult<Vec<u8>> {
    read_entry_capped(archive, name, MAX_XML_ENTRY_BYTES)
}

/// Read an entry of at most `limit` bytes.
fn read_entry_capped(
    archive: &mut Archive<'_>,
    name: &str,
    limit: u64,
) -> ExtractResult<Vec<u8>> {
    let entry = archive.by_name(name).map_err(ooxml)?;
    let mut out = Vec::new();
    entry
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(ooxml)?;
    if out.len() as u64 > limit {
        return Err(ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, limit
        )));
    }
    Ok(out)
}

/// Entries matching `<prefix>N.xml`, ordered by N.
fn numbered_entries(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .filter(|n| !n[prefix.len()..].contains('/'))
        .map(str::to_string)
        .collect();
    names.sort_by_key(|name| {
        name[prefix.len()..]
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn shared_strings(archive: &mut Archive<'_>) -> ExtractResult<Vec<String>> {
    if archive.index_for_name("xl/sharedStrings.xml").is_none() {
        return Ok(Vec::new());
    }
    let xml = read_entry(archive, "xl/sharedStrings.xml")?;
    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_t => current.push_str(&t.unescape().map_err(ooxml)?),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn sheet_names(archive: &mut Archive<'_>) -> ExtractResult<Vec<String>> {
    if archive.index_for_name("xl/workbook.xml").is_none() {
        return Ok(Vec::new());
    }
    let xml = read_entry(archive, "xl/workbook.xml")?;
    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut names = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = attribute(&e, b"name") {
                    names.push(name);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

/// Rows of one worksheet, cells tab-separated.
fn sheet_rows(xml: &[u8], shared: &[String]) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut in_value = false;
    let mut cells = 0usize;
    loop {
        if cells >= MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => cell_type = attribute(&e, b"t"),
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                let raw = t.unescape().map_err(ooxml)?;
                let value = if cell_type.as_deref() == Some("s") {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared.get(i).cloned())
                        .unwrap_or_default()
                } else {
                    raw.into_owned()
                };
                if !value.trim().is_empty() {
                    row.push(value);
                    cells += 1;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => cell_type = None,
                b"row" => {
                    if !row.is_empty() {
                        rows.push(row.join("\t"));
                    }
                    row.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml(e)),
            _ => {}
        }
        buf.clear();
    }
    if !row.is_empty() {
        rows.push(row.join("\t"));
    }
    Ok(rows)
}

/// Extract an .xlsx workbook: returns rendered text and the sheet count.
pub fn extract_workbook(bytes: &[u8]) -> ExtractResult<(String, usize)> {
    let mut archive = open_archive(bytes)?;
    let shared = shared_strings(&mut archive)?;
    let names = sheet_names(&mut archive)?;
    let sheets = numbered_entries(&archive, "xl/worksheets/sheet");

    let mut text = String::new();
    let mut count = 0;
    for (idx, entry) in sheets.iter().take(MAX_SHEETS).enumerate() {
        let xml = read_entry(&mut archive, entry)?;
        let rows = sheet_rows(&xml, &shared)?;
        let name = names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", idx + 1));
        count += 1;
        if rows.is_empty() {
            continue;
        }
        text.push_str(&format!("--- Sheet: {} ---\n{}\n\n", name, rows.join("\n")));
    }
    Ok((text.trim_end().to_string(), count))
}

/// Paragraphs of one slide (`a:p` blocks of `a:t` runs).
fn slide_paragraphs(xml: &[u8]) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_t = true,
            Ok(Event::Text(t)) if in_t => current.push_str(&t.unescape().map_err(ooxml)?),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ooxml(e)),
            _ => {}
        }
        buf.clear();
    }
    if !current.trim().is_empty() {
        paragraphs.push(current.trim().to_string());
    }
    Ok(paragraphs)
}

/// Extract a .pptx deck: returns rendered text and the slide count.
pub fn extract_deck(bytes: &[u8]) -> ExtractResult<(String, usize)> {
    let mut archive = open_archive(bytes)?;
    let slides = numbered_entries(&archive, "ppt/slides/slide");

    let mut text = String::new();
    for (idx, entry) in slides.iter().enumerate() {
        let xml = read_entry(&mut archive, entry)?;
        let paragraphs = slide_paragraphs(&xml)?;
        if paragraphs.is_empty() {
            continue;
        }
        text.push_str(&format!(
            "--- Slide {} ---\n{}\n\n",
            idx + 1,
            paragraphs.join("\n")
        ));
    }
    Ok((text.trim_end().to_string(), slides.len()))
}

/// Which OOXML container an [`OfficeExtractor`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OfficeKind {
    Workbook,
    Deck,
}

/// Extractor for .xlsx workbooks and .pptx decks.
#[derive(Debug, Clone)]
pub struct OfficeExtractor {
    kind: OfficeKind,
    formats: [FormatKind; 1],
}

impl OfficeExtractor {
    /// Excel workbook extractor; unit = sheets.
    pub fn spreadsheet() -> Self {
        Self {
            kind: OfficeKind::Workbook,
            formats: [FormatKind::Excel],
        }
    }

    /// PowerPoint deck extractor; unit = slides.
    pub fn presentation() -> Self {
        Self {
            kind: OfficeKind::Deck,
            formats: [FormatKind::PowerPoint],
        }
    }
}

#[async_trait]
impl Extractor for OfficeExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let format = self.formats[0];
        let path = locator.as_path().ok_or_else(|| {
            ExtractError::UnsupportedFormat(format!(
                "{} extraction needs a file path: {}",
                format.label(),
                locator
            ))
        })?;
        let content = tokio::fs::read(path).await?;
        let content_len = content.len();
        let kind = self.kind;

        let (text, units) = tokio::task::spawn_blocking(move || match kind {
            OfficeKind::Workbook => extract_workbook(&content),
            OfficeKind::Deck => extract_deck(&content),
        })
        .await??;

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        Ok(ExtractionResult::success(format, text, units)
            .with_metadata("file_size", content_len)
            .with_metadata("extraction_method", "ooxml"))
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &self.formats
    }

    fn name(&self) -> &str {
        match self.kind {
            OfficeKind::Workbook => "xlsx",
            OfficeKind::Deck => "pptx",
        }
    }
}
