//! Process-local key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::DocsiftResult;
use crate::traits::KeyValueStore;

/// Writes between sweeps of expired entries.
const SWEEP_INTERVAL: usize = 64;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory store with per-entry deadlines.
///
/// Expired entries are invisible to reads. Every 64th write drops them,
/// as does [`MemoryStore::purge_expired`].
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DocsiftResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn put_with_ttl(&self, key: &str, value: String, ttl: Duration) -> DocsiftResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_INTERVAL == 0 {
            entries.retain(|_, e| e.expires_at > now);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> DocsiftResult<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|e| e.expires_at > Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put_with_ttl("a", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store
            .put_with_ttl("a", "1".into(), Duration::from_secs(10))
            .await
            .unwrap();
        store
            .put_with_ttl("b", "2".into(), Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_expired_entries() {
        let store = MemoryStore::new();
        store
            .put_with_ttl("stale", "x".into(), Duration::from_secs(5))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;

        for i in 0..SWEEP_INTERVAL {
            store
                .put_with_ttl(&format!("k{}", i), "v".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        assert_eq!(store.len().await, SWEEP_INTERVAL);
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_refreshes_ttl() {
        let store = MemoryStore::new();
        store
            .put_with_ttl("a", "1".into(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store
            .put_with_ttl("a", "2".into(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }
}
