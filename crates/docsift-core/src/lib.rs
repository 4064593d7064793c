//! docsift-core - Core library for docsift.
//!
//! This crate provides job tracking, insight generation, and result
//! normalization around the extraction dispatcher in `docsift-extractors`.
//!
//! # Example
//!
//! ```ignore
//! use docsift_core::{DocsiftConfig, JobTracker, StoreFactory, SummarizePipeline, SummarizeRequest};
//!
//! let config = DocsiftConfig::from_env();
//! let store = StoreFactory::create(&config.store)?;
//! let tracker = Arc::new(JobTracker::new(store.clone(), config.jobs.clone()));
//! let pipeline = SummarizePipeline::new(tracker, dispatcher, insight);
//!
//! // Submit a file and poll its status
//! let job = pipeline.submit(SummarizeRequest::locator("user1", path)).await?;
//! let view = pipeline.tracker().status(&job.id).await?;
//! ```

pub mod config;
pub mod error;
pub mod insight;
pub mod jobs;
pub mod normalizer;
pub mod pipeline;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{
    DocsiftConfig, DocsiftConfigBuilder, EmbedderProviderConfig, LlmProvider, LlmProviderConfig,
};
pub use error::{DocsiftError, DocsiftResult, ErrorCode};
pub use insight::{truncate_text, InsightConfig, InsightGenerator, FALLBACK_MESSAGE};
pub use jobs::{JobConfig, JobTracker};
pub use normalizer::{generate_description, generate_title, normalize};
pub use pipeline::{ContentSource, MemoryResultSink, SummarizePipeline, SummarizeRequest};
pub use store::{MemoryStore, SqliteStore, StoreBackend, StoreConfig, StoreFactory};
pub use traits::{
    Embedder, EmbedderConfig, EmbedderProvider, GenerationOptions, KeyValueStore, Llm, LlmConfig,
    LlmResponse, ResultSink, TokenUsage,
};
pub use types::{
    AiResultPayload, BatchEmbeddingResult, EmbeddingResult, InsightResult, Job, JobMetadata,
    JobStatus, JobStatusView, JobUpdate, LogEntry, LogLevel, Message, MessageRole, SourceMeta,
    SummaryMode, SummaryOptions,
};
