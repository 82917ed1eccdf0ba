//! codebase-summarizer: turn a source tree into a structured JSON summary
//!
//! Files are discovered with gitignore-style filtering, grouped into batches,
//! described by an external summarization service, and merged into a single
//! document that is rewritten on disk after every batch.

pub mod analyze;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod utils;
