//! The aggregate document and everything that writes to it.

pub mod document;
pub mod merge;
pub mod optimize;
pub mod repair;
pub mod store;

pub use document::{AggregateDocument, CompletionStatus, Metadata};
pub use merge::{merge_batch, MergeOutcome};
pub use optimize::{optimize_document, optimize_file, OptimizeOutcome};
pub use store::OutputStore;
