//! Core traits for docsift providers and collaborators.

mod embedder;
mod llm;
mod sink;
mod store;

pub use embedder::*;
pub use llm::*;
pub use sink::*;
pub use store::*;
