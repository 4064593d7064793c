//! docsift - summarize one document or link from the command line.
//!
//! ```bash
//! docsift ./report.pdf --user alice --embed
//! docsift https://youtu.be/dQw4w9WgXcQ --config ./docsift.toml
//! ```
//!
//! The job's final status view is printed to stdout as JSON. Logs go to
//! stderr.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docsift_cli::{build_runtime, load_config};
use docsift_core::{JobStatus, SummarizeRequest};
use docsift_extractors::{FormatKind, Locator};

/// Extract, summarize, and optionally embed a document or link.
#[derive(Parser)]
#[command(name = "docsift", version, about)]
struct Cli {
    /// File path or http(s) URL to summarize.
    locator: String,

    /// Declared format: a name (`pdf`), MIME type, or extension.
    #[arg(long)]
    format: Option<String>,

    /// User id recorded on the job and result.
    #[arg(long, default_value = "local")]
    user: String,

    /// Configuration file (.toml, .json, .yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also compute an embedding of the extracted text.
    #[arg(long)]
    embed: bool,

    /// Summary mode: `detailed` or `brief`.
    #[arg(long)]
    mode: Option<String>,

    /// Summary language code.
    #[arg(long)]
    language: Option<String>,

    /// Status polling interval in milliseconds.
    #[arg(long, default_value_t = 250)]
    poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,docsift_core=debug,docsift_cli=debug")),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let runtime = build_runtime(&config).context("Failed to build pipeline")?;

    let mut request = SummarizeRequest::locator(cli.user, Locator::parse(&cli.locator));
    if let Some(declared) = &cli.format {
        match FormatKind::parse_declared(declared) {
            Some(format) => request = request.with_format(format),
            None => bail!("Unsupported format: {}", declared),
        }
    }
    if cli.embed {
        request = request.with_option("embed", true);
    }
    if let Some(mode) = cli.mode {
        request = request.with_option("mode", mode);
    }
    if let Some(language) = cli.language {
        request = request.with_option("language", language);
    }

    let tracker = runtime.pipeline.tracker().clone();
    let job = runtime.pipeline.submit(request).await?;
    info!(job_id = %job.id, source = %job.source, "Job submitted");

    let poll = Duration::from_millis(cli.poll_ms.max(10));
    let view = loop {
        let view = tracker
            .status(&job.id)
            .await?
            .with_context(|| format!("Job {} expired before finishing", job.id))?;
        if view.status.is_terminal() {
            break view;
        }
        debug!(stage = %view.stage, progress = view.progress, "Waiting");
        tokio::time::sleep(poll).await;
    };

    println!("{}", serde_json::to_string_pretty(&view)?);

    if view.status == JobStatus::Failed {
        std::process::exit(1);
    }
    info!(saved = runtime.sink.len().await, "Done");
    Ok(())
}
