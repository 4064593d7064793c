//! Key-value store implementations.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{DocsiftError, DocsiftResult};
use crate::traits::KeyValueStore;

/// Store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Key-value store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the SQLite backend. In-memory when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Factory for creating key-value stores.
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store from configuration.
    pub fn create(config: &StoreConfig) -> DocsiftResult<Arc<dyn KeyValueStore>> {
        match (config.backend, &config.path) {
            (StoreBackend::Memory, None) => Ok(Arc::new(MemoryStore::new())),
            (StoreBackend::Memory, Some(_)) => Err(DocsiftError::Configuration(
                "store.path is only valid with the sqlite backend".to_string(),
            )),
            (StoreBackend::Sqlite, Some(path)) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Ok(Arc::new(SqliteStore::open(path)?))
            }
            (StoreBackend::Sqlite, None) => Ok(Arc::new(SqliteStore::in_memory()?)),
        }
    }
}
