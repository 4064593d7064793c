//! Ephemeral key-value store abstraction.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::DocsiftResult;

/// String-valued store with per-key expiry.
///
/// Backs both the job tracker and the embedding cache. Implementations give
/// single-key atomicity only: a read-modify-write from two writers is
/// last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a live value. Expired and absent keys both return `None`.
    async fn get(&self, key: &str) -> DocsiftResult<Option<String>>;

    /// Write a value that stops being readable after `ttl`.
    async fn put_with_ttl(&self, key: &str, value: String, ttl: Duration) -> DocsiftResult<()>;

    /// Remove a key. Returns whether a live value was removed.
    async fn delete(&self, key: &str) -> DocsiftResult<bool>;
}
