//! Job records tracked across a summarize pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle state of a job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a job in this state may move to `next`.
    ///
    /// Queued may go anywhere, processing may repeat or finish, and a
    /// terminal state may only repeat itself.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            Self::Queued => true,
            Self::Processing => next != Self::Queued,
            Self::Completed | Self::Failed => next == *self,
        }
    }
}

/// Severity of a job log entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

/// One entry in a job's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }
}

/// Timing and usage recorded while a job runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_processing_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl JobMetadata {
    /// Overlay the fields set in `other`.
    pub fn merge(&mut self, other: JobMetadata) {
        if other.processing_started_at.is_some() {
            self.processing_started_at = other.processing_started_at;
        }
        if other.processing_completed_at.is_some() {
            self.processing_completed_at = other.processing_completed_at;
        }
        if other.total_processing_time_ms.is_some() {
            self.total_processing_time_ms = other.total_processing_time_ms;
        }
        if other.tokens_used.is_some() {
            self.tokens_used = other.tokens_used;
        }
    }
}

/// A tracked pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub user_id: String,
    pub content_type: String,
    /// Locator of the submitted content.
    pub source: String,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
    pub status: JobStatus,
    pub stage: String,
    /// 0 to 100.
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: JobMetadata,
}

impl Job {
    /// Create a queued job with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        content_type: impl Into<String>,
        source: impl Into<String>,
        options: HashMap<String, serde_json::Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            content_type: content_type.into(),
            source: source.into(),
            options,
            status: JobStatus::Queued,
            stage: "initializing".to_string(),
            progress: 0,
            created_at: now,
            updated_at: now,
            logs: Vec::new(),
            result: None,
            error: None,
            metadata: JobMetadata::default(),
        }
    }

    /// Boolean option, false when absent or not a bool.
    pub fn option_flag(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Read projection with the last `log_window` log entries.
    pub fn status_view(&self, log_window: usize) -> JobStatusView {
        let skip = self.logs.len().saturating_sub(log_window);
        JobStatusView {
            job_id: self.id.clone(),
            status: self.status,
            stage: self.stage.clone(),
            progress: self.progress,
            created_at: self.created_at,
            updated_at: self.updated_at,
            logs: self.logs[skip..].to_vec(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }

    /// Why the job's fields contradict its terminal status, if they do.
    ///
    /// Completed jobs carry a non-null result, no error, and progress 100.
    /// Failed jobs carry an error, no result, and progress 0.
    pub fn terminal_violation(&self) -> Option<&'static str> {
        match self.status {
            JobStatus::Completed => {
                if matches!(self.result, None | Some(serde_json::Value::Null)) {
                    Some("completed job has no result")
                } else if self.error.is_some() {
                    Some("completed job has an error")
                } else if self.progress != 100 {
                    Some("completed job progress must be 100")
                } else {
                    None
                }
            }
            JobStatus::Failed => {
                if self.error.is_none() {
                    Some("failed job has no error")
                } else if self.result.is_some() {
                    Some("failed job has a result")
                } else if self.progress != 0 {
                    Some("failed job progress must be 0")
                } else {
                    None
                }
            }
            JobStatus::Queued | JobStatus::Processing => None,
        }
    }
}

/// Polling view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub stage: String,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub logs: Vec<LogEntry>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Partial update merged into a stored job.
///
/// `None` leaves a field untouched. `result` and `error` use a nested
/// option so an update can clear them.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub stage: Option<String>,
    pub progress: Option<u8>,
    pub result: Option<Option<serde_json::Value>>,
    pub error: Option<Option<String>>,
    pub metadata: Option<JobMetadata>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Set progress, clamped to 100.
    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    pub fn result(mut self, result: Option<serde_json::Value>) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn metadata(mut self, metadata: JobMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Shorthand for a `processing` stage report.
    pub fn processing(stage: impl Into<String>, progress: u8) -> Self {
        Self::new()
            .status(JobStatus::Processing)
            .stage(stage)
            .progress(progress)
    }

    /// Merge into `job`. Does not touch `updated_at`.
    pub fn apply_to(self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(stage) = self.stage {
            job.stage = stage;
        }
        if let Some(progress) = self.progress {
            job.progress = progress;
        }
        if let Some(result) = self.result {
            job.result = result;
        }
        if let Some(error) = self.error {
            job.error = error;
        }
        if let Some(metadata) = self.metadata {
            job.metadata.merge(metadata);
        }
    }
}
