//! Result normalizer.
//!
//! Reshapes extraction and insight output into the persisted result schema.
//! Either sub-result may be missing; every field falls back to a default.

use serde_json::{json, Map, Value};

use docsift_extractors::ExtractionResult;

use crate::types::{AiResultPayload, InsightResult, SourceMeta};

pub const DEFAULT_TITLE: &str = "Summarized Content";
pub const DEFAULT_DESCRIPTION: &str = "Content summarized via AI";
pub const DEFAULT_TOOL_TYPE: &str = "summarize";

const TITLE_WORDS: usize = 8;
const TITLE_MAX_CHARS: usize = 60;
const DESCRIPTION_WORDS: usize = 20;
const DESCRIPTION_MAX_CHARS: usize = 150;

/// Build the persisted payload for one pipeline run.
pub fn normalize(
    extraction: Option<&ExtractionResult>,
    insight: Option<&InsightResult>,
    source: &SourceMeta,
) -> AiResultPayload {
    let summary = insight
        .filter(|i| i.success)
        .map(|i| i.insights.as_str())
        .filter(|s| !s.trim().is_empty());

    let title = source
        .title
        .clone()
        .or_else(|| summary.map(generate_title))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = source
        .description
        .clone()
        .or_else(|| summary.map(generate_description))
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let status = match extraction {
        Some(e) if !e.success => "failed",
        _ => "completed",
    };

    AiResultPayload {
        user_id: source.user_id.clone(),
        tool_type: source
            .tool_type
            .clone()
            .unwrap_or_else(|| DEFAULT_TOOL_TYPE.to_string()),
        title,
        description,
        input_data: input_snapshot(extraction, source),
        result_data: result_data(extraction, insight),
        metadata: metadata(extraction, insight),
        status: status.to_string(),
    }
}

/// First eight words of `text`, capped at 60 characters.
pub fn generate_title(text: &str) -> String {
    clip_words(text, TITLE_WORDS, TITLE_MAX_CHARS)
}

/// First twenty words of `text`, capped at 150 characters.
pub fn generate_description(text: &str) -> String {
    clip_words(text, DESCRIPTION_WORDS, DESCRIPTION_MAX_CHARS)
}

fn clip_words(text: &str, words: usize, max_chars: usize) -> String {
    let head = text.trim().split(' ').take(words).collect::<Vec<_>>().join(" ");
    if head.chars().count() > max_chars {
        let mut clipped: String = head.chars().take(max_chars - 3).collect();
        clipped.push_str("...");
        clipped
    } else {
        head
    }
}

fn input_snapshot(extraction: Option<&ExtractionResult>, source: &SourceMeta) -> Value {
    let format = extraction
        .and_then(|e| e.format_kind)
        .map(|f| f.to_string());
    json!({
        "source": source.source,
        "content_type": source.content_type,
        "format": format,
        "options": source.options,
    })
}

fn result_data(extraction: Option<&ExtractionResult>, insight: Option<&InsightResult>) -> Value {
    let mut data = Map::new();
    data.insert(
        "summary".into(),
        json!(insight.map(|i| i.insights.as_str()).unwrap_or_default()),
    );
    data.insert(
        "summary_available".into(),
        json!(insight.is_some_and(|i| i.success)),
    );

    if let Some(extraction) = extraction {
        data.insert("text".into(), json!(extraction.text));
        data.insert("word_count".into(), json!(extraction.word_count));
        data.insert("character_count".into(), json!(extraction.character_count));
        data.insert("unit_count".into(), json!(extraction.unit_count));
        data.insert("unit_label".into(), json!(extraction.unit_label()));
        if extraction.is_mock() {
            data.insert("mock".into(), json!(true));
        }
    } else {
        data.insert("text".into(), json!(""));
        data.insert("word_count".into(), json!(0));
        data.insert("character_count".into(), json!(0));
    }

    Value::Object(data)
}

fn metadata(extraction: Option<&ExtractionResult>, insight: Option<&InsightResult>) -> Value {
    let mut meta = Map::new();

    if let Some(insight) = insight {
        meta.insert("model_used".into(), json!(insight.model_used));
        meta.insert("tokens_used".into(), json!(insight.tokens_used));
        meta.insert("confidence_score".into(), json!(insight.confidence_score));
        meta.insert(
            "insight_processing_time_ms".into(),
            json!(insight.processing_time_ms),
        );
        if let Some(error) = &insight.error {
            meta.insert("insight_error".into(), json!(error));
        }
    }

    if let Some(extraction) = extraction {
        meta.insert("extraction".into(), json!(extraction.metadata));
        if let Some(error) = &extraction.error {
            meta.insert("extraction_error".into(), json!(error));
        }
    }

    Value::Object(meta)
}
