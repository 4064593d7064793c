//! Core types for docsift.

mod insight;
mod job;
mod message;
mod payload;

pub use insight::*;
pub use job::*;
pub use message::*;
pub use payload::*;
