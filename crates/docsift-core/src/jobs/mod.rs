//! Job tracking over an ephemeral key-value store.

mod tracker;

pub use tracker::JobTracker;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Job retention and status view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Retention window, refreshed on every write.
    pub ttl_secs: u64,
    /// Log entries included in a status view.
    pub log_window: usize,
    /// Store key prefix for job records.
    pub key_prefix: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            log_window: 10,
            key_prefix: "summarize_job_".to_string(),
        }
    }
}

impl JobConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
