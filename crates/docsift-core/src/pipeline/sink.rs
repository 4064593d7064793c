//! In-process result sink.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::DocsiftResult;
use crate::traits::ResultSink;
use crate::types::AiResultPayload;

/// Keeps saved payloads in memory, in save order.
#[derive(Default)]
pub struct MemoryResultSink {
    saved: RwLock<Vec<(String, AiResultPayload)>>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<AiResultPayload> {
        self.saved
            .read()
            .await
            .iter()
            .find(|(saved_id, _)| saved_id == id)
            .map(|(_, payload)| payload.clone())
    }

    /// All payloads saved for `user_id`, oldest first.
    pub async fn for_user(&self, user_id: &str) -> Vec<AiResultPayload> {
        self.saved
            .read()
            .await
            .iter()
            .filter(|(_, payload)| payload.user_id == user_id)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.saved.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.saved.read().await.is_empty()
    }
}

#[async_trait]
impl ResultSink for MemoryResultSink {
    async fn save(&self, payload: AiResultPayload) -> DocsiftResult<String> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, user_id = %payload.user_id, tool_type = %payload.tool_type, "Result saved");
        self.saved.write().await.push((id.clone(), payload));
        Ok(id)
    }
}
