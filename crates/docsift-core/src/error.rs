//! Error types for docsift operations.
//!
//! Expected failures of extraction and remote calls are folded into result
//! records and never reach this type. `DocsiftError` covers infrastructure
//! faults: store I/O, serialization, configuration, illegal job transitions,
//! and the raw provider errors that the insight generator folds.

use docsift_extractors::ExtractError;
use thiserror::Error;

/// Result type alias for docsift operations.
pub type DocsiftResult<T> = Result<T, DocsiftError>;

/// Main error type for docsift operations.
#[derive(Error, Debug)]
pub enum DocsiftError {
    /// Job absent or expired.
    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: String, code: ErrorCode },

    /// Status change not allowed from the job's current status.
    #[error("Invalid job transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
        code: ErrorCode,
    },

    /// Update would leave a job whose fields contradict its status.
    #[error("Invalid job state for {job_id}: {reason}")]
    InvalidJobState {
        job_id: String,
        reason: String,
        code: ErrorCode,
    },

    /// Completion provider failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding provider failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Remote endpoint returned an error status or was unreachable.
    #[error("Remote service error: {message}")]
    RemoteService {
        message: String,
        code: ErrorCode,
        status: Option<u16>,
    },

    /// Key-value store operation failed.
    #[error("Store error: {message}")]
    Store {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Result sink rejected a payload.
    #[error("Result sink error: {message}")]
    Sink { message: String, code: ErrorCode },

    /// Extraction fault that could not be folded into a result.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Jobs (JOB_xxx)
    JobNotFound,
    JobInvalidTransition,
    JobInvalidState,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmInvalidResponse,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,
    EmbCountMismatch,

    // Remote (NET_xxx)
    NetTimeout,
    NetConnectionFailed,
    NetBadStatus,

    // Store (STORE_xxx)
    StoreOperationFailed,
    StoreCorrupted,

    // Sink (SINK_xxx)
    SinkRejected,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::JobNotFound => "JOB_001",
            ErrorCode::JobInvalidTransition => "JOB_002",
            ErrorCode::JobInvalidState => "JOB_003",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmInvalidResponse => "LLM_003",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::EmbCountMismatch => "EMB_003",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::NetBadStatus => "NET_003",
            ErrorCode::StoreOperationFailed => "STORE_001",
            ErrorCode::StoreCorrupted => "STORE_002",
            ErrorCode::SinkRejected => "SINK_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl DocsiftError {
    /// Create a job-not-found error.
    pub fn job_not_found(job_id: impl Into<String>) -> Self {
        Self::JobNotFound {
            job_id: job_id.into(),
            code: ErrorCode::JobNotFound,
        }
    }

    /// Create an invalid-transition error.
    pub fn invalid_transition(
        job_id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            job_id: job_id.into(),
            from: from.to_string(),
            to: to.to_string(),
            code: ErrorCode::JobInvalidTransition,
        }
    }

    /// Create an invalid-state error.
    pub fn invalid_job_state(job_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidJobState {
            job_id: job_id.into(),
            reason: reason.into(),
            code: ErrorCode::JobInvalidState,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an error for a provider that returned the wrong number of vectors.
    pub fn embedding_count_mismatch(expected: usize, got: usize) -> Self {
        Self::Embedding {
            message: format!("Expected {} embeddings, got {}", expected, got),
            code: ErrorCode::EmbCountMismatch,
            source: None,
        }
    }

    /// Create a remote service error without a status code.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            status: None,
        }
    }

    /// Create a timeout error for a remote call.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
            code: ErrorCode::NetTimeout,
            status: None,
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::StoreOperationFailed,
            source: None,
        }
    }

    /// Create a result sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
            code: ErrorCode::SinkRejected,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::JobNotFound { code, .. } => *code,
            Self::InvalidTransition { code, .. } => *code,
            Self::InvalidJobState { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::RemoteService { code, .. } => *code,
            Self::Store { code, .. } => *code,
            Self::Sink { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether retrying the same remote call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RemoteService { code, status, .. } => match code {
                ErrorCode::NetTimeout | ErrorCode::NetConnectionFailed => true,
                _ => status.is_some_and(|s| s == 429 || s >= 500),
            },
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::JobNotFound { .. } => {
                Some("The job may have expired; submit the content again")
            }
            Self::InvalidTransition { .. } => Some("Finished jobs cannot change status"),
            Self::InvalidJobState { .. } => Some("Use complete or fail to finish a job"),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::RemoteService { .. } => Some("Please check network access to the AI endpoint"),
            Self::Store { .. } => Some("Please check the job store path and permissions"),
            _ => None,
        }
    }

    /// Convert from an HTTP status code and response body.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        let code = match status {
            408 | 504 => ErrorCode::NetTimeout,
            _ => ErrorCode::NetBadStatus,
        };
        Self::RemoteService {
            message: format!("HTTP {}: {}", status, body),
            code,
            status: Some(status),
        }
    }
}

impl From<rusqlite::Error> for DocsiftError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store {
            message: err.to_string(),
            code: ErrorCode::StoreOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_not_found() {
        let err = DocsiftError::job_not_found("job-1");
        assert_eq!(err.code(), ErrorCode::JobNotFound);
        assert_eq!(err.code().as_str(), "JOB_001");
        assert!(err.to_string().contains("job-1"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = DocsiftError::invalid_transition("job-2", "completed", "processing");
        assert_eq!(
            err.to_string(),
            "Invalid job transition for job-2: completed -> processing"
        );
    }

    #[test]
    fn test_http_status_transience() {
        assert!(DocsiftError::from_http_status(503, "overloaded").is_transient());
        assert!(DocsiftError::from_http_status(429, "slow down").is_transient());
        assert!(!DocsiftError::from_http_status(401, "bad key").is_transient());
        assert!(DocsiftError::remote("connection refused").is_transient());
        assert!(!DocsiftError::llm("empty choices").is_transient());
    }

    #[test]
    fn test_http_error_keeps_body() {
        let err = DocsiftError::from_http_status(400, r#"{"error":"context too long"}"#);
        assert!(err.to_string().contains("context too long"));
        assert_eq!(err.code().as_str(), "NET_003");
    }
}
