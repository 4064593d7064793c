//! Insight generator: summaries and cached embeddings.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{truncate_text, InsightConfig, FALLBACK_MESSAGE};
use crate::error::{DocsiftError, DocsiftResult};
use crate::traits::{Embedder, GenerationOptions, KeyValueStore, Llm};
use crate::types::{
    BatchEmbeddingResult, EmbeddingResult, InsightResult, Message, SummaryMode, SummaryOptions,
};

/// Turns extracted text into summaries and vectors.
///
/// Every method returns a result record. Provider failures are folded into
/// `success=false` with the provider's error text attached.
pub struct InsightGenerator {
    llm: Arc<dyn Llm>,
    embedder: Arc<dyn Embedder>,
    cache: Arc<dyn KeyValueStore>,
    config: InsightConfig,
}

impl InsightGenerator {
    pub fn new(
        llm: Arc<dyn Llm>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<dyn KeyValueStore>,
        config: InsightConfig,
    ) -> Self {
        Self {
            llm,
            embedder,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Build the summarization prompt for `text`.
    pub fn build_prompt(text: &str, options: &SummaryOptions) -> String {
        let mut prompt = format!(
            "Please analyze and summarize the following content in {}:\n\nContent: {}\n\n",
            options.language, text
        );
        match options.mode {
            SummaryMode::Detailed => {
                prompt.push_str("Provide a comprehensive summary including:\n");
                prompt.push_str("1. Main topics and themes\n");
                prompt.push_str("2. Key points and important details\n");
                prompt.push_str("3. Target audience\n");
                prompt.push_str("4. Educational value\n");
                prompt.push_str("5. Overall assessment\n");
            }
            SummaryMode::Brief => {
                prompt.push_str(
                    "Provide a brief summary focusing on the most important points.\n",
                );
            }
        }
        prompt
    }

    /// Summarize `text`, truncated to the summary budget first.
    pub async fn summarize(&self, text: &str, options: &SummaryOptions) -> InsightResult {
        let started = Instant::now();
        let model = self.llm.model_name().to_string();
        if text.trim().is_empty() {
            warn!("Skipping summary of empty text");
            return InsightResult {
                success: false,
                insights: FALLBACK_MESSAGE.to_string(),
                model_used: model,
                tokens_used: 0,
                confidence_score: None,
                processing_time_ms: 0,
                error: Some("Cannot summarize empty text".to_string()),
            };
        }

        let input = truncate_text(text, self.config.summary_max_tokens);
        if input.len() < text.len() {
            debug!(
                original_len = text.len(),
                truncated_len = input.len(),
                "Truncated summary input"
            );
        }

        let messages = vec![Message::user(Self::build_prompt(input, options))];
        let generation = GenerationOptions {
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let outcome = self
            .llm
            .generate(&messages, Some(generation))
            .await
            .and_then(|response| {
                let tokens = response.total_tokens();
                match response.content {
                    Some(content) if !content.trim().is_empty() => Ok((content, tokens)),
                    _ => Err(DocsiftError::llm("Empty completion")),
                }
            });
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok((insights, tokens_used)) => {
                info!(model = %model, tokens_used, elapsed_ms, "Summary generated");
                InsightResult {
                    success: true,
                    insights,
                    model_used: model,
                    tokens_used,
                    confidence_score: Some(self.config.confidence_score),
                    processing_time_ms: elapsed_ms,
                    error: None,
                }
            }
            Err(e) => {
                warn!(model = %model, error = %e, elapsed_ms, "Summary generation failed");
                InsightResult {
                    success: false,
                    insights: FALLBACK_MESSAGE.to_string(),
                    model_used: model,
                    tokens_used: 0,
                    confidence_score: None,
                    processing_time_ms: elapsed_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Send `prompt` as-is and return the completion, or the fallback
    /// message on any failure.
    pub async fn complete_or_fallback(&self, prompt: &str) -> String {
        match self.llm.generate(&[Message::user(prompt)], None).await {
            Ok(response) if !response.content_or_empty().trim().is_empty() => {
                response.content.unwrap_or_default()
            }
            Ok(_) => {
                warn!("Completion returned no content");
                FALLBACK_MESSAGE.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Completion failed");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Cache key for a piece of embedding input.
    pub fn cache_key(&self, text: &str) -> String {
        let normalized = truncate_text(text.trim(), self.config.embedding_max_tokens);
        format!("{}{:x}", self.config.cache_prefix, md5::compute(normalized))
    }

    /// Embed `text`, serving repeated inputs from the cache.
    pub async fn embed(&self, text: &str) -> EmbeddingResult {
        let model = self.embedder.model_name().to_string();
        let normalized = truncate_text(text.trim(), self.config.embedding_max_tokens);
        if normalized.is_empty() {
            return EmbeddingResult {
                success: false,
                vector: Vec::new(),
                cached: false,
                model_used: model,
                error: Some("Cannot embed empty text".to_string()),
            };
        }

        let key = self.cache_key(text);
        match self.cached_vector(&key).await {
            Some(vector) => {
                debug!(key = %key, "Embedding cache hit");
                return EmbeddingResult {
                    success: true,
                    vector,
                    cached: true,
                    model_used: model,
                    error: None,
                };
            }
            None => debug!(key = %key, "Embedding cache miss"),
        }

        let outcome = self.embedder.embed(normalized).await.and_then(|vector| {
            self.check_dimension(&vector)?;
            Ok(vector)
        });

        match outcome {
            Ok(vector) => {
                self.store_vector(&key, &vector).await;
                EmbeddingResult {
                    success: true,
                    vector,
                    cached: false,
                    model_used: model,
                    error: None,
                }
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Embedding failed");
                EmbeddingResult {
                    success: false,
                    vector: Vec::new(),
                    cached: false,
                    model_used: model,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Embed several texts in one provider call. Not cached.
    ///
    /// Vectors come back in input order. Any failure, including a count
    /// mismatch, fails the whole batch.
    pub async fn embed_batch(&self, texts: &[String]) -> BatchEmbeddingResult {
        let model = self.embedder.model_name().to_string();
        if texts.is_empty() {
            return BatchEmbeddingResult {
                success: true,
                vectors: Vec::new(),
                model_used: model,
                error: None,
            };
        }

        let inputs: Vec<String> = texts
            .iter()
            .map(|t| truncate_text(t, self.config.embedding_max_tokens).to_string())
            .collect();

        let outcome = self.embedder.embed_batch(&inputs).await.and_then(|vectors| {
            if vectors.len() != inputs.len() {
                return Err(DocsiftError::embedding_count_mismatch(
                    inputs.len(),
                    vectors.len(),
                ));
            }
            for vector in &vectors {
                self.check_dimension(vector)?;
            }
            Ok(vectors)
        });

        match outcome {
            Ok(vectors) => {
                info!(model = %model, count = vectors.len(), "Batch embedded");
                BatchEmbeddingResult {
                    success: true,
                    vectors,
                    model_used: model,
                    error: None,
                }
            }
            Err(e) => {
                warn!(model = %model, count = texts.len(), error = %e, "Batch embedding failed");
                BatchEmbeddingResult {
                    success: false,
                    vectors: Vec::new(),
                    model_used: model,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> DocsiftResult<()> {
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(DocsiftError::embedding(format!(
                "Expected {} dimensions, got {}",
                expected,
                vector.len()
            )));
        }
        Ok(())
    }

    async fn cached_vector(&self, key: &str) -> Option<Vec<f32>> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(vector) => Some(vector),
                Err(e) => {
                    warn!(key, error = %e, "Discarding unreadable cached embedding");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Embedding cache read failed");
                None
            }
        }
    }

    async fn store_vector(&self, key: &str, vector: &[f32]) {
        let raw = match serde_json::to_string(vector) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Could not serialize embedding for cache");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .put_with_ttl(key, raw, self.config.cache_ttl())
            .await
        {
            warn!(key, error = %e, "Embedding cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::traits::{LlmResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedLlm {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Llm for ScriptedLlm {
        async fn generate(
            &self,
            messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> DocsiftResult<LlmResponse> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            match &self.reply {
                Some(reply) => Ok(LlmResponse {
                    content: Some(reply.clone()),
                    usage: Some(TokenUsage {
                        prompt_tokens: 20,
                        completion_tokens: 5,
                        total_tokens: 25,
                    }),
                }),
                None => Err(DocsiftError::from_http_status(
                    500,
                    r#"{"error":{"message":"upstream overloaded"}}"#,
                )),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    /// Deterministic embedder that counts provider calls.
    struct CountingEmbedder {
        calls: AtomicUsize,
        dims: usize,
        short_batch: bool,
    }

    impl CountingEmbedder {
        fn new(dims: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                dims,
                short_batch: false,
            }
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            (0..self.dims)
                .map(|i| (text.len() + i) as f32 / 10.0)
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> DocsiftResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> DocsiftResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut vectors: Vec<_> = texts.iter().map(|t| self.vector_for(t)).collect();
            if self.short_batch {
                vectors.pop();
            }
            Ok(vectors)
        }

        fn dimension(&self) -> usize {
            self.dims
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn generator(llm: ScriptedLlm, embedder: Arc<CountingEmbedder>) -> InsightGenerator {
        InsightGenerator::new(
            Arc::new(llm),
            embedder,
            Arc::new(MemoryStore::new()),
            InsightConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let generator = generator(
            ScriptedLlm::replying("A short summary."),
            Arc::new(CountingEmbedder::new(4)),
        );

        let result = generator
            .summarize("Hello world. Hello again.", &SummaryOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.insights, "A short summary.");
        assert_eq!(result.model_used, "scripted");
        assert_eq!(result.tokens_used, 25);
        assert_eq!(result.confidence_score, Some(0.8));
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_summarize_failure_returns_fallback_with_body() {
        let generator = generator(ScriptedLlm::failing(), Arc::new(CountingEmbedder::new(4)));

        let result = generator
            .summarize("anything", &SummaryOptions::default())
            .await;

        assert!(!result.success);
        assert_eq!(result.insights, FALLBACK_MESSAGE);
        assert!(result.error.unwrap().contains("upstream overloaded"));
    }

    #[tokio::test]
    async fn test_summarize_empty_text_skips_provider() {
        let llm = Arc::new(ScriptedLlm::replying("made up summary"));
        let generator = InsightGenerator::new(
            llm.clone(),
            Arc::new(CountingEmbedder::new(4)),
            Arc::new(MemoryStore::new()),
            InsightConfig::default(),
        );

        let result = generator.summarize("   \n", &SummaryOptions::default()).await;

        assert!(!result.success);
        assert_eq!(result.insights, FALLBACK_MESSAGE);
        assert_eq!(result.tokens_used, 0);
        assert_eq!(result.error.as_deref(), Some("Cannot summarize empty text"));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summarize_truncates_input() {
        let llm = Arc::new(ScriptedLlm::replying("ok"));
        let generator = InsightGenerator::new(
            llm.clone(),
            Arc::new(CountingEmbedder::new(4)),
            Arc::new(MemoryStore::new()),
            InsightConfig {
                summary_max_tokens: 10,
                ..Default::default()
            },
        );

        let long = "x".repeat(500);
        generator.summarize(&long, &SummaryOptions::default()).await;

        let prompt = llm.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains(&"x".repeat(40)));
        assert!(!prompt.contains(&"x".repeat(41)));
    }

    #[test]
    fn test_prompt_modes() {
        let brief = SummaryOptions {
            mode: SummaryMode::Brief,
            language: "de".into(),
            ..Default::default()
        };
        let prompt = InsightGenerator::build_prompt("Inhalt", &brief);
        assert!(prompt.starts_with("Please analyze and summarize the following content in de:"));
        assert!(prompt.contains("Content: Inhalt"));
        assert!(prompt.contains("brief summary"));

        let detailed = InsightGenerator::build_prompt("x", &SummaryOptions::default());
        assert!(detailed.contains("5. Overall assessment"));
    }

    #[tokio::test]
    async fn test_complete_or_fallback() {
        let ok = generator(ScriptedLlm::replying("pong"), Arc::new(CountingEmbedder::new(4)));
        assert_eq!(ok.complete_or_fallback("ping").await, "pong");

        let down = generator(ScriptedLlm::failing(), Arc::new(CountingEmbedder::new(4)));
        assert_eq!(down.complete_or_fallback("ping").await, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_embed_is_cached() {
        let embedder = Arc::new(CountingEmbedder::new(8));
        let generator = generator(ScriptedLlm::replying("ok"), embedder.clone());

        let first = generator.embed("The same text").await;
        let second = generator.embed("The same text").await;

        assert!(first.success && second.success);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.vector, second.vector);
        assert_eq!(first.dimension(), 8);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_key_ignores_surrounding_whitespace() {
        let embedder = Arc::new(CountingEmbedder::new(4));
        let generator = generator(ScriptedLlm::replying("ok"), embedder.clone());

        assert_eq!(generator.cache_key("  text \n"), generator.cache_key("text"));
        assert!(generator.cache_key("text").starts_with("embedding_"));
        assert_eq!(generator.cache_key("text").len(), "embedding_".len() + 32);

        generator.embed("text").await;
        generator.embed("  text\n").await;
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch_fails() {
        struct WrongSize;

        #[async_trait]
        impl Embedder for WrongSize {
            async fn embed(&self, _text: &str) -> DocsiftResult<Vec<f32>> {
                Ok(vec![0.0; 3])
            }

            fn dimension(&self) -> usize {
                1536
            }

            fn model_name(&self) -> &str {
                "wrong"
            }
        }

        let generator = InsightGenerator::new(
            Arc::new(ScriptedLlm::replying("ok")),
            Arc::new(WrongSize),
            Arc::new(MemoryStore::new()),
            InsightConfig::default(),
        );
        let result = generator.embed("text").await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("1536"));
        assert!(result.vector.is_empty());
    }

    #[tokio::test]
    async fn test_embed_empty_text_skips_provider() {
        let embedder = Arc::new(CountingEmbedder::new(4));
        let generator = generator(ScriptedLlm::replying("ok"), embedder.clone());

        let result = generator.embed("   ").await;
        assert!(!result.success);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order_in_one_call() {
        let embedder = Arc::new(CountingEmbedder::new(2));
        let generator = generator(ScriptedLlm::replying("ok"), embedder.clone());
        let texts = vec!["a".to_string(), "bbb".to_string(), "cc".to_string()];

        let result = generator.embed_batch(&texts).await;

        assert!(result.success);
        assert_eq!(result.vectors.len(), 3);
        assert_eq!(result.vectors[0], embedder.vector_for("a"));
        assert_eq!(result.vectors[1], embedder.vector_for("bbb"));
        assert_eq!(result.vectors[2], embedder.vector_for("cc"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_embed_batch_count_mismatch_fails_whole_batch() {
        let embedder = Arc::new(CountingEmbedder {
            short_batch: true,
            ..CountingEmbedder::new(2)
        });
        let generator = generator(ScriptedLlm::replying("ok"), embedder);
        let texts = vec!["a".to_string(), "b".to_string()];

        let result = generator.embed_batch(&texts).await;
        assert!(!result.success);
        assert!(result.vectors.is_empty());
        assert!(result.error.unwrap().contains("Expected 2 embeddings, got 1"));
    }
}
