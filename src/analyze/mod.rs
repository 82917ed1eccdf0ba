//! Batch planning, budgeting, and the summarizer call.

pub mod batch;
pub mod budget;

pub use batch::{batch_count, load_batch_file, Batch, BatchAnalyzer, BatchFile, RetryPolicy};
pub use budget::allocate;
