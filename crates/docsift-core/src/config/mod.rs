//! Configuration system for docsift.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use docsift_extractors::ExtractionConfig;

use crate::error::{DocsiftError, DocsiftResult};
use crate::insight::InsightConfig;
use crate::jobs::JobConfig;
use crate::store::{StoreBackend, StoreConfig};
use crate::traits::{EmbedderConfig, EmbedderProvider, LlmConfig};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Ollama,
}

/// Provider configuration with type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

/// Embedder provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

/// Top-level docsift configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsiftConfig {
    /// Completion provider.
    pub llm: LlmProviderConfig,
    /// Embedding provider.
    pub embedder: EmbedderProviderConfig,
    /// Extraction timeouts and external scripts.
    pub extraction: ExtractionConfig,
    /// Job retention and status view.
    pub jobs: JobConfig,
    /// Truncation budgets and embedding cache.
    pub insight: InsightConfig,
    /// Key-value store backend.
    pub store: StoreConfig,
}

impl DocsiftConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DocsiftResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| DocsiftError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| DocsiftError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| DocsiftError::Configuration(e.to_string())),
            _ => Err(DocsiftError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables over defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables on this configuration.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Providers
        if let Some(api_key) = var("OPENAI_API_KEY") {
            self.llm.config.api_key = Some(api_key.clone());
            self.embedder.config.api_key = Some(api_key);
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.llm.config.base_url = Some(base_url.clone());
            self.embedder.config.base_url = Some(base_url);
        }
        if let Some(model) = var("DOCSIFT_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(model) = var("DOCSIFT_EMBEDDING_MODEL") {
            self.embedder.config.model = model;
        }

        // Jobs and store
        if let Some(ttl) = var("DOCSIFT_JOB_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.jobs.ttl_secs = ttl;
        }
        if let Some(path) = var("DOCSIFT_STORE_PATH") {
            self.store.backend = StoreBackend::Sqlite;
            self.store.path = Some(PathBuf::from(path));
        }

        // Extraction
        if let Some(python) = var("DOCSIFT_PYTHON") {
            self.extraction.interpreter = PathBuf::from(python);
        }
        let scripts = &mut self.extraction.scripts;
        for (key, slot) in [
            ("DOCSIFT_TEXT_SCRIPT", &mut scripts.text),
            ("DOCSIFT_EXCEL_SCRIPT", &mut scripts.excel),
            ("DOCSIFT_POWERPOINT_SCRIPT", &mut scripts.powerpoint),
            ("DOCSIFT_YOUTUBE_SCRIPT", &mut scripts.youtube),
        ] {
            if let Some(path) = var(key) {
                *slot = Some(PathBuf::from(path));
            }
        }
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> DocsiftConfigBuilder {
        DocsiftConfigBuilder::default()
    }
}

/// Builder for DocsiftConfig.
#[derive(Default)]
pub struct DocsiftConfigBuilder {
    config: DocsiftConfig,
}

impl DocsiftConfigBuilder {
    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set extraction configuration.
    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.config.extraction = config;
        self
    }

    /// Set job configuration.
    pub fn jobs(mut self, config: JobConfig) -> Self {
        self.config.jobs = config;
        self
    }

    /// Set insight configuration.
    pub fn insight(mut self, config: InsightConfig) -> Self {
        self.config.insight = config;
        self
    }

    /// Use a SQLite store at `path`.
    pub fn sqlite_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store = StoreConfig {
            backend: StoreBackend::Sqlite,
            path: Some(path.into()),
        };
        self
    }

    /// Build the configuration.
    pub fn build(self) -> DocsiftConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DocsiftConfig::default();
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.config.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.config.max_tokens, 1000);
        assert_eq!(config.embedder.config.model, "text-embedding-ada-002");
        assert_eq!(config.embedder.config.embedding_dims, 1536);
        assert_eq!(config.jobs.ttl_secs, 3600);
        assert_eq!(config.jobs.log_window, 10);
        assert_eq!(config.insight.embedding_cache_ttl_secs, 86_400);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("DOCSIFT_LLM_MODEL", "gpt-4o-mini"),
            ("DOCSIFT_JOB_TTL_SECS", "120"),
            ("DOCSIFT_STORE_PATH", "/var/lib/docsift/jobs.db"),
            ("DOCSIFT_EXCEL_SCRIPT", "/opt/excel.py"),
        ]
        .into_iter()
        .collect();

        let mut config = DocsiftConfig::default();
        config.apply_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.llm.config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.embedder.config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.config.model, "gpt-4o-mini");
        assert_eq!(config.jobs.ttl_secs, 120);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(
            config.extraction.scripts.excel,
            Some(PathBuf::from("/opt/excel.py"))
        );
        assert_eq!(config.extraction.scripts.text, None);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "ollama"
model = "llama3.2"
base_url = "http://localhost:11434/v1"

[jobs]
ttl_secs = 60

[extraction]
text_timeout_secs = 5
"#
        )
        .unwrap();

        let config = DocsiftConfig::from_file(file.path()).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.config.model, "llama3.2");
        assert_eq!(config.llm.config.temperature, 0.7);
        assert_eq!(config.jobs.ttl_secs, 60);
        assert_eq!(config.jobs.log_window, 10);
        assert_eq!(config.extraction.text_timeout_secs, 5);
        assert_eq!(config.extraction.document_timeout_secs, 300);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = DocsiftConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, DocsiftError::Configuration(_)));
    }
}
