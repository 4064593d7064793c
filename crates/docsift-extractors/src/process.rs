//! Extractors backed by an external interpreter and script.
//!
//! The script is invoked as `<interpreter> <script> <locator>` and must print
//! exactly one JSON document on stdout shaped like an extraction result.
//! Diagnostics belong on stderr, which is captured and surfaced on failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{ExtractionResult, FormatKind, Locator};
use crate::Extractor;

/// Default process timeout for document formats.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(300);

/// Result document printed by an external extractor script.
#[derive(Debug, Deserialize)]
struct ProcessOutput {
    success: bool,
    #[serde(default)]
    text: String,
    #[serde(default, alias = "lines", alias = "pages", alias = "sheets", alias = "slides")]
    unit_count: usize,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    extraction_method: Option<String>,
}

/// Extractor that shells out to a script.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    name: String,
    interpreter: PathBuf,
    script: PathBuf,
    formats: Vec<FormatKind>,
    timeout: Duration,
}

impl ProcessExtractor {
    /// Create a process extractor for the given formats.
    pub fn new(
        name: impl Into<String>,
        interpreter: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
        formats: impl Into<Vec<FormatKind>>,
    ) -> Self {
        Self {
            name: name.into(),
            interpreter: interpreter.into(),
            script: script.into(),
            formats: formats.into(),
            timeout: DEFAULT_PROCESS_TIMEOUT,
        }
    }

    /// Override the process timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Script path this extractor runs.
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Run the script with `argument` and parse its output as `format`.
    pub async fn invoke(&self, argument: &str, format: FormatKind) -> ExtractResult<ExtractionResult> {
        debug!(
            interpreter = %self.interpreter.display(),
            script = %self.script.display(),
            argument,
            "Running external extractor"
        );

        let child = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(argument)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| ExtractError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExtractError::ProcessFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: if stderr.is_empty() {
                    "no error output".to_string()
                } else {
                    stderr
                },
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_output(stdout.trim(), format)
    }

    fn parse_output(stdout: &str, format: FormatKind) -> ExtractResult<ExtractionResult> {
        let parsed: ProcessOutput = serde_json::from_str(stdout)
            .map_err(|e| ExtractError::MalformedOutput(e.to_string()))?;

        if !parsed.success {
            return Err(ExtractError::ExtractionFailed(
                parsed
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "external extractor reported failure".to_string()),
            ));
        }

        let mut result = ExtractionResult::success(format, parsed.text, parsed.unit_count);
        result.metadata = parsed.metadata;
        if let Some(method) = parsed.extraction_method {
            result = result.with_metadata("extraction_method", method);
        }
        Ok(result)
    }
}

#[async_trait]
impl Extractor for ProcessExtractor {
    async fn extract(&self, locator: &Locator) -> ExtractResult<ExtractionResult> {
        let format = self.primary_format();
        self.invoke(&locator.to_string(), format).await
    }

    fn supported_formats(&self) -> &[FormatKind] {
        &self.formats
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    fn script(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
        writeln!(file, "{}", body).unwrap();
        file
    }

    fn extractor(script: &tempfile::NamedTempFile) -> ProcessExtractor {
        ProcessExtractor::new("sh-excel", "sh", script.path(), vec![FormatKind::Excel])
    }

    #[tokio::test]
    async fn test_parses_json_stdout() {
        let script = script(r#"printf '{"success": true, "text": "alpha beta gamma", "sheets": 2, "metadata": {"engine": "sh"}}'"#);
        let result = extractor(&script)
            .extract(&Locator::parse("/tmp/book.xlsx"))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.unit_count, 2);
        assert_eq!(result.word_count, 3);
        assert_eq!(result.metadata["engine"], "sh");
    }

    #[tokio::test]
    async fn test_non_zero_exit_surfaces_stderr() {
        let script = script("echo 'openpyxl is not installed' >&2\nexit 3");
        let result = extractor(&script)
            .run(&Locator::parse("/tmp/book.xlsx"))
            .await;

        assert!(!result.success);
        assert!(result.text.is_empty());
        assert!(result.error.unwrap().contains("openpyxl is not installed"));
    }

    #[tokio::test]
    async fn test_malformed_stdout() {
        let script = script("echo 'Traceback (most recent call last):'");
        let err = extractor(&script)
            .extract(&Locator::parse("/tmp/book.xlsx"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedExternalOutput);
    }

    #[tokio::test]
    async fn test_reported_failure() {
        let script = script(r#"printf '{"success": false, "text": "", "sheets": 0, "error": "File not readable"}'"#);
        let err = extractor(&script)
            .extract(&Locator::parse("/tmp/book.xlsx"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not readable"));
    }

    #[tokio::test]
    async fn test_process_timeout() {
        let script = script("sleep 5");
        let err = extractor(&script)
            .with_timeout(Duration::from_millis(100))
            .extract(&Locator::parse("/tmp/book.xlsx"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_receives_locator_argument() {
        let script = script(r#"printf '{"success": true, "text": "%s", "lines": 1}' "$1""#);
        let result = extractor(&script)
            .extract(&Locator::parse("/data/input.xlsx"))
            .await
            .unwrap();
        assert_eq!(result.text, "/data/input.xlsx");
    }
}
