//! SQLite-backed key-value store.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{DocsiftError, DocsiftResult};
use crate::traits::KeyValueStore;

/// Key-value store in a single `kv` table.
///
/// Expiry is an absolute unix-millisecond deadline checked on read.
/// Each write also deletes expired rows. Queries run on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> DocsiftResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> DocsiftResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DocsiftResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_kv_expires ON kv(expires_at);
        "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Delete expired rows. Returns how many were removed.
    pub async fn purge_expired(&self) -> DocsiftResult<usize> {
        let now = Utc::now().timestamp_millis();
        self.with_conn(move |conn| {
            Ok(conn.execute("DELETE FROM kv WHERE expires_at <= ?1", params![now])?)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> DocsiftResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DocsiftResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| DocsiftError::store("SQLite connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .map_err(|e| DocsiftError::Internal(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> DocsiftResult<Option<String>> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT value FROM kv WHERE key = ?1 AND expires_at > ?2",
                    params![key, now],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }

    async fn put_with_ttl(&self, key: &str, value: String, ttl: Duration) -> DocsiftResult<()> {
        let key = key.to_string();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let now = Utc::now().timestamp_millis();
        let expires_at = now.saturating_add(ttl_ms);
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM kv WHERE expires_at <= ?1", params![now])?;
            conn.execute(
                "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> DocsiftResult<bool> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.with_conn(move |conn| {
            let live: bool = conn
                .query_row(
                    "SELECT 1 FROM kv WHERE key = ?1 AND expires_at > ?2",
                    params![key, now],
                    |_| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(live)
        })
        .await
    }
}
