//! docsift-cli - Command-line runner for docsift.
//!
//! Wires providers, stores, and the extraction dispatcher from a
//! [`DocsiftConfig`](docsift_core::DocsiftConfig) into a runnable pipeline.

pub mod factory;

pub use factory::{build_runtime, load_config, Runtime};
