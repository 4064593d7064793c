//! Background summarize pipeline.
//!
//! One run extracts content, summarizes it, optionally embeds it, then
//! normalizes and persists the result. Every stage reports progress through
//! the [`JobTracker`], which is the only thing a polling caller reads.

mod sink;

pub use sink::MemoryResultSink;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use docsift_extractors::{line_count, Dispatcher, ExtractionResult, FormatKind, Locator};

use crate::error::{DocsiftError, DocsiftResult};
use crate::insight::InsightGenerator;
use crate::jobs::JobTracker;
use crate::normalizer::normalize;
use crate::traits::ResultSink;
use crate::types::{
    EmbeddingResult, Job, JobMetadata, JobUpdate, LogLevel, SourceMeta, SummaryOptions,
};

/// What to summarize.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// File path or URL routed through the dispatcher.
    Locator(Locator),
    /// Text supplied directly; extraction is skipped.
    Text(String),
}

/// A summarize submission.
#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    pub user_id: String,
    pub content: ContentSource,
    /// Format override; detected from the locator when absent.
    pub declared_format: Option<FormatKind>,
    /// Free-form options. `mode`, `language`, and `embed` are understood.
    pub options: HashMap<String, Value>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SummarizeRequest {
    pub fn locator(user_id: impl Into<String>, locator: impl Into<Locator>) -> Self {
        Self::new(user_id, ContentSource::Locator(locator.into()))
    }

    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(user_id, ContentSource::Text(text.into()))
    }

    fn new(user_id: impl Into<String>, content: ContentSource) -> Self {
        Self {
            user_id: user_id.into(),
            content,
            declared_format: None,
            options: HashMap::new(),
            title: None,
            description: None,
        }
    }

    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.declared_format = Some(format);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Content type recorded on the job.
    pub fn content_type(&self) -> String {
        match &self.content {
            ContentSource::Text(_) => FormatKind::Text.to_string(),
            ContentSource::Locator(locator) => self
                .declared_format
                .or_else(|| FormatKind::detect(locator))
                .map(|f| f.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// Source label recorded on the job.
    pub fn source_label(&self) -> String {
        match &self.content {
            ContentSource::Locator(locator) => locator.to_string(),
            ContentSource::Text(_) => "inline text".to_string(),
        }
    }

    fn wants_embedding(&self) -> bool {
        self.options
            .get("embed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    fn source_meta(&self) -> SourceMeta {
        SourceMeta {
            user_id: self.user_id.clone(),
            source: self.source_label(),
            content_type: self.content_type(),
            title: self.title.clone(),
            description: self.description.clone(),
            tool_type: None,
            options: self.options.clone(),
        }
    }
}

/// Runs summarize jobs against a shared tracker.
#[derive(Clone)]
pub struct SummarizePipeline {
    tracker: Arc<JobTracker>,
    dispatcher: Arc<Dispatcher>,
    insight: Arc<InsightGenerator>,
    sink: Option<Arc<dyn ResultSink>>,
}

impl SummarizePipeline {
    pub fn new(
        tracker: Arc<JobTracker>,
        dispatcher: Arc<Dispatcher>,
        insight: Arc<InsightGenerator>,
    ) -> Self {
        Self {
            tracker,
            dispatcher,
            insight,
            sink: None,
        }
    }

    /// Persist finished payloads through `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn tracker(&self) -> &Arc<JobTracker> {
        &self.tracker
    }

    /// Create the queued job without starting it.
    pub async fn create_job(&self, request: &SummarizeRequest) -> DocsiftResult<Job> {
        self.tracker
            .create(
                request.user_id.clone(),
                request.content_type(),
                request.source_label(),
                request.options.clone(),
            )
            .await
    }

    /// Create a job and run it on the tokio runtime. Returns the queued job;
    /// poll the tracker for progress.
    pub async fn submit(&self, request: SummarizeRequest) -> DocsiftResult<Job> {
        let job = self.create_job(&request).await?;

        let pipeline = self.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.process(&job_id, request).await {
                error!(job_id = %job_id, error = %e, "Summarize job aborted");
            }
        });

        Ok(job)
    }

    /// Run every stage for `job_id` inline.
    ///
    /// Expected failures end in a failed job and `Ok(())`. An `Err` means the
    /// tracker itself could not be updated; the job is failed on a best-effort
    /// basis before returning.
    pub async fn process(&self, job_id: &str, request: SummarizeRequest) -> DocsiftResult<()> {
        match self.run(job_id, request).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                if let Err(fail_err) = self.tracker.fail(job_id, message.clone()).await {
                    warn!(job_id, error = %fail_err, "Could not mark job failed");
                } else {
                    self.log(
                        job_id,
                        format!("Job failed with exception: {}", message),
                        LogLevel::Error,
                    )
                    .await;
                }
                Err(e)
            }
        }
    }

    async fn run(&self, job_id: &str, request: SummarizeRequest) -> DocsiftResult<()> {
        let started = Instant::now();

        self.advance(
            job_id,
            JobUpdate::processing("extracting", 10).metadata(JobMetadata {
                processing_started_at: Some(Utc::now()),
                ..Default::default()
            }),
        )
        .await?;
        self.log(job_id, "Starting content processing", LogLevel::Info)
            .await;

        let extraction = self.extract(&request).await;
        if !extraction.success {
            let error = extraction
                .error
                .clone()
                .unwrap_or_else(|| "Unknown processing error".to_string());
            warn!(job_id, error = %error, "Extraction failed");
            self.tracker.fail(job_id, error.clone()).await?;
            self.log(
                job_id,
                format!("Processing failed: {}", error),
                LogLevel::Error,
            )
            .await;
            return Ok(());
        }

        self.advance(job_id, JobUpdate::processing("summarizing", 50))
            .await?;
        self.log(
            job_id,
            "Content extracted, starting summarization",
            LogLevel::Info,
        )
        .await;

        let options = SummaryOptions::from_job_options(&request.options);
        let insight = self.insight.summarize(&extraction.text, &options).await;
        if !insight.success {
            self.log(
                job_id,
                "AI summarization unavailable, using fallback response",
                LogLevel::Warning,
            )
            .await;
        }

        let embedding = if request.wants_embedding() {
            self.advance(job_id, JobUpdate::processing("embedding", 75))
                .await?;
            let embedding = self.insight.embed(&extraction.text).await;
            if embedding.success {
                self.log(
                    job_id,
                    format!("Embedding generated ({} dimensions)", embedding.dimension()),
                    LogLevel::Info,
                )
                .await;
            } else {
                self.log(
                    job_id,
                    format!(
                        "Embedding failed: {}",
                        embedding.error.as_deref().unwrap_or("unknown error")
                    ),
                    LogLevel::Warning,
                )
                .await;
            }
            Some(embedding)
        } else {
            None
        };

        self.advance(job_id, JobUpdate::processing("saving", 90))
            .await?;

        let mut payload = normalize(Some(&extraction), Some(&insight), &request.source_meta());
        if let (Some(embedding), Value::Object(data)) = (&embedding, &mut payload.result_data) {
            data.insert("embedding".into(), embedding_summary(embedding));
        }

        let ai_result_id = match &self.sink {
            Some(sink) => match sink.save(payload.clone()).await {
                Ok(id) => Some(id),
                Err(e) => {
                    let error = format!("Failed to save result: {}", e);
                    warn!(job_id, error = %e, "Result sink rejected payload");
                    self.tracker.fail(job_id, error.clone()).await?;
                    self.log(job_id, error, LogLevel::Error).await;
                    return Ok(());
                }
            },
            None => None,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.advance(
            job_id,
            JobUpdate::new().metadata(JobMetadata {
                processing_completed_at: Some(Utc::now()),
                total_processing_time_ms: Some(elapsed_ms),
                tokens_used: Some(insight.tokens_used),
                ..Default::default()
            }),
        )
        .await?;

        let mut result = payload.result_data;
        if let Value::Object(data) = &mut result {
            data.insert("title".into(), json!(payload.title));
            data.insert("description".into(), json!(payload.description));
            data.insert("ai_result_id".into(), json!(ai_result_id));
        }

        self.tracker
            .complete(job_id, result)
            .await?
            .ok_or_else(|| DocsiftError::job_not_found(job_id))?;
        self.log(job_id, "Summarization completed successfully", LogLevel::Info)
            .await;

        info!(
            job_id,
            elapsed_ms,
            tokens_used = insight.tokens_used,
            summary_ok = insight.success,
            "Summarize job completed"
        );
        Ok(())
    }

    async fn extract(&self, request: &SummarizeRequest) -> ExtractionResult {
        match &request.content {
            ContentSource::Locator(locator) => {
                self.dispatcher
                    .extract(locator, request.declared_format)
                    .await
            }
            ContentSource::Text(text) => {
                ExtractionResult::success(FormatKind::Text, text.clone(), line_count(text))
                    .with_metadata("extraction_method", "inline")
                    .normalized()
            }
        }
    }

    /// Apply a stage update, treating a vanished job as an error.
    async fn advance(&self, job_id: &str, update: JobUpdate) -> DocsiftResult<Job> {
        self.tracker
            .update(job_id, update)
            .await?
            .ok_or_else(|| DocsiftError::job_not_found(job_id))
    }

    async fn log(&self, job_id: &str, message: impl Into<String>, level: LogLevel) {
        match self.tracker.append_log(job_id, message, level).await {
            Ok(true) => {}
            Ok(false) => warn!(job_id, "Log dropped for missing job"),
            Err(e) => warn!(job_id, error = %e, "Failed to append job log"),
        }
    }
}

fn embedding_summary(embedding: &EmbeddingResult) -> Value {
    json!({
        "success": embedding.success,
        "dimension": embedding.dimension(),
        "cached": embedding.cached,
        "model": embedding.model_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::{InsightConfig, FALLBACK_MESSAGE};
    use crate::jobs::JobConfig;
    use crate::store::MemoryStore;
    use crate::traits::{Embedder, GenerationOptions, Llm, LlmResponse};
    use crate::types::{AiResultPayload, JobStatus, Message};
    use async_trait::async_trait;
    use mockall::mock;
    use std::io::Write;

    struct EchoLlm;

    #[async_trait]
    impl Llm for EchoLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> DocsiftResult<LlmResponse> {
            Ok(LlmResponse {
                content: Some("Greetings repeated twice.".into()),
                usage: None,
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct DownLlm;

    #[async_trait]
    impl Llm for DownLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> DocsiftResult<LlmResponse> {
            Err(DocsiftError::timeout("request timed out after 30s"))
        }

        fn model_name(&self) -> &str {
            "down"
        }
    }

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> DocsiftResult<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    mock! {
        Sink {}

        #[async_trait]
        impl ResultSink for Sink {
            async fn save(&self, payload: AiResultPayload) -> DocsiftResult<String>;
        }
    }

    fn pipeline(llm: Arc<dyn Llm>) -> SummarizePipeline {
        let store = Arc::new(MemoryStore::new());
        let tracker = Arc::new(JobTracker::new(store.clone(), JobConfig::default()));
        let insight = Arc::new(InsightGenerator::new(
            llm,
            Arc::new(FixedEmbedder),
            store,
            InsightConfig::default(),
        ));
        SummarizePipeline::new(tracker, Arc::new(Dispatcher::with_defaults()), insight)
    }

    fn hello_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Hello world. Hello again.\n").unwrap();
        file
    }

    async fn run(pipeline: &SummarizePipeline, request: SummarizeRequest) -> Job {
        let job = pipeline.create_job(&request).await.unwrap();
        pipeline.process(&job.id, request).await.unwrap();
        pipeline.tracker().get(&job.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_file_runs_to_completion() {
        let file = hello_file();
        let pipeline = pipeline(Arc::new(EchoLlm));

        let job = run(&pipeline, SummarizeRequest::locator("u1", file.path().to_path_buf())).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.content_type, "text");
        assert_eq!(job.progress, 100);
        assert_eq!(job.stage, "done");
        let result = job.result.unwrap();
        assert_eq!(result["text"], "Hello world. Hello again.\n");
        assert_eq!(result["word_count"], 4);
        assert_eq!(result["character_count"], 26);
        assert_eq!(result["summary"], "Greetings repeated twice.");
        assert!(result["ai_result_id"].is_null());
        assert!(job.metadata.processing_started_at.is_some());
        assert!(job.metadata.total_processing_time_ms.is_some());

        let messages: Vec<_> = job.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"Starting content processing"));
        assert_eq!(messages.last(), Some(&"Summarization completed successfully"));
    }

    #[tokio::test]
    async fn test_remote_outage_degrades_to_fallback() {
        let file = hello_file();
        let pipeline = pipeline(Arc::new(DownLlm));

        let job = run(&pipeline, SummarizeRequest::locator("u1", file.path().to_path_buf())).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap()["summary"], FALLBACK_MESSAGE);
        assert!(job.logs.iter().any(|l| l.level == LogLevel::Warning));
    }

    #[tokio::test]
    async fn test_missing_file_fails_job() {
        let pipeline = pipeline(Arc::new(EchoLlm));
        let request = SummarizeRequest::locator("u1", Locator::parse("/no/such/notes.txt"));

        let job = run(&pipeline, request).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert_eq!(job.result, None);
        assert_eq!(job.error.as_deref(), Some("File not found: /no/such/notes.txt"));
        assert_eq!(job.logs.last().unwrap().level, LogLevel::Error);
    }

    #[tokio::test]
    async fn test_inline_text_skips_extraction() {
        let pipeline = pipeline(Arc::new(EchoLlm));
        let request = SummarizeRequest::text("u1", "Inline notes about rust")
            .with_option("embed", true)
            .with_title("Notes");

        let job = run(&pipeline, request).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.source, "inline text");
        let result = job.result.unwrap();
        assert_eq!(result["title"], "Notes");
        assert_eq!(result["word_count"], 4);
        assert_eq!(result["embedding"]["dimension"], 4);
        assert_eq!(result["embedding"]["cached"], false);
    }

    #[tokio::test]
    async fn test_sink_receives_payload_once() {
        let mut sink = MockSink::new();
        sink.expect_save()
            .withf(|payload| payload.user_id == "u9" && payload.tool_type == "summarize")
            .times(1)
            .returning(|_| Ok("result-42".to_string()));

        let pipeline = pipeline(Arc::new(EchoLlm)).with_sink(Arc::new(sink));
        let job = run(&pipeline, SummarizeRequest::text("u9", "Some text to keep")).await;

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap()["ai_result_id"], "result-42");
    }

    #[tokio::test]
    async fn test_sink_failure_fails_job() {
        let mut sink = MockSink::new();
        sink.expect_save()
            .times(1)
            .returning(|_| Err(DocsiftError::sink("database offline")));

        let pipeline = pipeline(Arc::new(EchoLlm)).with_sink(Arc::new(sink));
        let job = run(&pipeline, SummarizeRequest::text("u1", "Some text")).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("database offline"));
    }

    #[tokio::test]
    async fn test_process_unknown_job_is_an_error() {
        let pipeline = pipeline(Arc::new(EchoLlm));
        let err = pipeline
            .process("ghost", SummarizeRequest::text("u1", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::JobNotFound { .. }));
    }

    #[test]
    fn test_request_labels() {
        let pdf = SummarizeRequest::locator("u1", Locator::parse("/tmp/report.pdf"));
        assert_eq!(pdf.content_type(), "pdf");
        assert_eq!(pdf.source_label(), "/tmp/report.pdf");

        let declared = SummarizeRequest::locator("u1", Locator::parse("/tmp/blob"))
            .with_format(FormatKind::Word);
        assert_eq!(declared.content_type(), "word");

        let unknown = SummarizeRequest::locator("u1", Locator::parse("/tmp/blob"));
        assert_eq!(unknown.content_type(), "unknown");

        let video = SummarizeRequest::locator("u1", Locator::parse("https://youtu.be/dQw4w9WgXcQ"));
        assert_eq!(video.content_type(), "youtube");
    }
}
