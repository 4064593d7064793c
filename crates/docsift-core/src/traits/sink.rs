//! Persistence boundary for finished results.

use async_trait::async_trait;

use crate::error::DocsiftResult;
use crate::types::AiResultPayload;

/// Stores normalized results on behalf of the surrounding application.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist a payload and return its identifier.
    async fn save(&self, payload: AiResultPayload) -> DocsiftResult<String>;
}
