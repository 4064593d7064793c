//! Wiring a pipeline from configuration.

use std::path::Path;
use std::sync::Arc;

use docsift_core::config::DocsiftConfig;
use docsift_core::error::DocsiftResult;
use docsift_core::{
    InsightGenerator, JobTracker, MemoryResultSink, StoreFactory, SummarizePipeline,
};
use docsift_embeddings::EmbedderFactory;
use docsift_extractors::Dispatcher;
use docsift_llm::LlmFactory;

/// A wired pipeline and the sink it saves into.
pub struct Runtime {
    pub pipeline: SummarizePipeline,
    pub sink: Arc<MemoryResultSink>,
}

/// Load configuration from `path` when given, then overlay the environment.
pub fn load_config(path: Option<&Path>) -> DocsiftResult<DocsiftConfig> {
    let mut config = match path {
        Some(path) => DocsiftConfig::from_file(path)?,
        None => DocsiftConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

/// Build a pipeline from configuration.
///
/// The job tracker and the embedding cache share one store.
pub fn build_runtime(config: &DocsiftConfig) -> DocsiftResult<Runtime> {
    let store = StoreFactory::create(&config.store)?;
    let llm = LlmFactory::from_config(&config.llm)?;
    let embedder = EmbedderFactory::from_config(&config.embedder)?;

    let tracker = Arc::new(JobTracker::new(store.clone(), config.jobs.clone()));
    let insight = Arc::new(InsightGenerator::new(
        llm,
        embedder,
        store,
        config.insight.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::from_config(config.extraction.clone()));
    let sink = Arc::new(MemoryResultSink::new());

    let pipeline = SummarizePipeline::new(tracker, dispatcher, insight).with_sink(sink.clone());
    Ok(Runtime { pipeline, sink })
}
