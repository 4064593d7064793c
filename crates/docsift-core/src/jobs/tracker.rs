//! Job state machine backed by a [`KeyValueStore`].

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::JobConfig;
use crate::error::{DocsiftError, DocsiftResult};
use crate::traits::KeyValueStore;
use crate::types::{Job, JobStatus, JobStatusView, JobUpdate, LogEntry, LogLevel};

const LOCK_STRIPES: usize = 64;

/// Records pipeline progress so callers can poll without blocking.
///
/// A missing job (never created, deleted, or expired) is reported as
/// `Ok(None)` or `false`; the three cases are indistinguishable. Writes to
/// the same job id through one tracker are serialized. Separate trackers or
/// processes sharing a store are last-write-wins.
pub struct JobTracker {
    store: Arc<dyn KeyValueStore>,
    config: JobConfig,
    locks: Vec<Mutex<()>>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, config: JobConfig) -> Self {
        Self {
            store,
            config,
            locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    fn key(&self, job_id: &str) -> String {
        format!("{}{}", self.config.key_prefix, job_id)
    }

    fn stripe(&self, job_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        job_id.hash(&mut hasher);
        &self.locks[(hasher.finish() as usize) % self.locks.len()]
    }

    async fn load(&self, job_id: &str) -> DocsiftResult<Option<Job>> {
        match self.store.get(&self.key(job_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, job: &Job) -> DocsiftResult<()> {
        let raw = serde_json::to_string(job)?;
        self.store
            .put_with_ttl(&self.key(&job.id), raw, self.config.ttl())
            .await
    }

    /// Create a queued job and persist it.
    pub async fn create(
        &self,
        user_id: impl Into<String>,
        content_type: impl Into<String>,
        source: impl Into<String>,
        options: HashMap<String, serde_json::Value>,
    ) -> DocsiftResult<Job> {
        let job = Job::new(user_id, content_type, source, options);
        self.save(&job).await?;
        info!(
            job_id = %job.id,
            user_id = %job.user_id,
            content_type = %job.content_type,
            "Job created"
        );
        Ok(job)
    }

    /// Read the full job record.
    pub async fn get(&self, job_id: &str) -> DocsiftResult<Option<Job>> {
        self.load(job_id).await
    }

    /// Merge `update` into the stored job and refresh its TTL.
    ///
    /// Returns `Ok(None)` when the job is missing,
    /// [`DocsiftError::InvalidTransition`] when the status change is illegal,
    /// and [`DocsiftError::InvalidJobState`] when the merged job would
    /// contradict a terminal status. Nothing is written on error.
    pub async fn update(&self, job_id: &str, update: JobUpdate) -> DocsiftResult<Option<Job>> {
        let _guard = self.stripe(job_id).lock().await;
        let Some(mut job) = self.load(job_id).await? else {
            debug!(job_id, "Update for missing job");
            return Ok(None);
        };

        if let Some(next) = update.status {
            if !job.status.can_transition_to(next) {
                return Err(DocsiftError::invalid_transition(job_id, job.status, next));
            }
        }

        update.apply_to(&mut job);
        if let Some(reason) = job.terminal_violation() {
            return Err(DocsiftError::invalid_job_state(job_id, reason));
        }
        job.updated_at = Utc::now();
        self.save(&job).await?;

        info!(
            job_id,
            status = %job.status,
            stage = %job.stage,
            progress = job.progress,
            "Job updated"
        );
        Ok(Some(job))
    }

    /// Append a log entry. Returns `false` when the job is missing.
    pub async fn append_log(
        &self,
        job_id: &str,
        message: impl Into<String>,
        level: LogLevel,
    ) -> DocsiftResult<bool> {
        let _guard = self.stripe(job_id).lock().await;
        let Some(mut job) = self.load(job_id).await? else {
            return Ok(false);
        };

        job.logs.push(LogEntry::new(level, message));
        job.updated_at = Utc::now();
        self.save(&job).await?;
        Ok(true)
    }

    /// Mark the job completed with `result`. Repeating the call is a no-op
    /// apart from `updated_at`. A `null` result is rejected.
    pub async fn complete(
        &self,
        job_id: &str,
        result: serde_json::Value,
    ) -> DocsiftResult<Option<Job>> {
        self.update(
            job_id,
            JobUpdate::new()
                .status(JobStatus::Completed)
                .stage("done")
                .progress(100)
                .result(Some(result))
                .error(None),
        )
        .await
    }

    /// Mark the job failed with `error`.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) -> DocsiftResult<Option<Job>> {
        self.update(
            job_id,
            JobUpdate::new()
                .status(JobStatus::Failed)
                .stage("error")
                .progress(0)
                .result(None)
                .error(Some(error.into())),
        )
        .await
    }

    /// Polling view with the most recent log entries.
    pub async fn status(&self, job_id: &str) -> DocsiftResult<Option<JobStatusView>> {
        Ok(self
            .load(job_id)
            .await?
            .map(|job| job.status_view(self.config.log_window)))
    }

    /// The result of a completed job. `None` for any other status.
    pub async fn result(&self, job_id: &str) -> DocsiftResult<Option<serde_json::Value>> {
        Ok(self
            .load(job_id)
            .await?
            .filter(|job| job.status == JobStatus::Completed)
            .and_then(|job| job.result))
    }

    /// Remove a job. Returns whether it existed.
    pub async fn delete(&self, job_id: &str) -> DocsiftResult<bool> {
        let _guard = self.stripe(job_id).lock().await;
        let removed = self.store.delete(&self.key(job_id)).await?;
        if removed {
            info!(job_id, "Job deleted");
        }
        Ok(removed)
    }

    pub async fn exists(&self, job_id: &str) -> DocsiftResult<bool> {
        Ok(self.store.get(&self.key(job_id)).await?.is_some())
    }
}
