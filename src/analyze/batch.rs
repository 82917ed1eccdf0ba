//! Batch assembly and the summarizer call with retry.

use crate::domain::FileRecord;
use crate::llm::prompt::{analysis_prompt, ANALYSIS_SYSTEM};
use crate::llm::{CompletionRequest, Summarizer};
use crate::utils::read_file_safe;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const TRUNCATION_MARKER: &str = "\n\n... [content truncated for length] ...\n";

/// A file in a batch with its content loaded.
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub relative_path: String,
    pub size_bytes: u64,
    pub content: String,
}

/// A bounded group of files analyzed by one summarizer call.
#[derive(Debug, Clone)]
pub struct Batch {
    /// 1-based position of this batch in the run.
    pub index: usize,
    pub total: usize,
    pub files: Vec<BatchFile>,
    pub token_budget: usize,
}

impl Batch {
    pub fn byte_size(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.relative_path.clone()).collect()
    }

    /// Text sent to the summarizer: each file under a numbered header.
    pub fn payload(&self, truncation_limit: usize) -> String {
        let mut content = String::new();
        for (i, file) in self.files.iter().enumerate() {
            content.push_str(&format!("\n--- FILE {}: {} ---\n\n", i + 1, file.relative_path));
            content.push_str(&truncate_content(&file.content, truncation_limit));
            content.push_str("\n\n");
        }
        content
    }
}

/// Cut `content` after `limit` characters and append the truncation marker.
pub fn truncate_content(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

/// Read a file for a batch. Read failures become an inline error line.
pub fn load_batch_file(record: &FileRecord) -> BatchFile {
    let content = match read_file_safe(&record.path) {
        Ok((content, _encoding)) => content,
        Err(err) => {
            tracing::error!("Error reading file {}: {err:#}", record.path.display());
            format!("ERROR: Unable to read file - {err}")
        }
    };
    BatchFile { relative_path: record.relative_path.clone(), size_bytes: record.size_bytes, content }
}

/// Number of batches needed for `file_count` files.
pub fn batch_count(file_count: usize, batch_size: usize) -> usize {
    file_count.div_ceil(batch_size.max(1))
}

/// Exponential backoff: `initial_delay`, then doubling, for at most `max_attempts` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_delay: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay.saturating_mul(1u32 << (retry.saturating_sub(1)).min(16))
    }
}

/// Sends batches to a [`Summarizer`] and always hands back text.
pub struct BatchAnalyzer<'a> {
    summarizer: &'a dyn Summarizer,
    retry: RetryPolicy,
    truncation_limit: usize,
}

impl<'a> BatchAnalyzer<'a> {
    pub fn new(summarizer: &'a dyn Summarizer, retry: RetryPolicy, truncation_limit: usize) -> Self {
        Self { summarizer, retry, truncation_limit }
    }

    /// Raw response text for the batch.
    ///
    /// After the last failed attempt a synthesized `{"files": {...}}` payload
    /// with one `error` entry per file is returned instead of an error.
    pub fn analyze(&self, batch: &Batch) -> String {
        tracing::info!(
            "Analyzing batch of {} files with token limit {}",
            batch.files.len(),
            batch.token_budget
        );

        let prompt = analysis_prompt(&batch.payload(self.truncation_limit), batch.token_budget);
        let request = CompletionRequest { system: ANALYSIS_SYSTEM, prompt: &prompt, temperature: None };
        let attempts = self.retry.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.summarizer.complete(&request) {
                Ok(text) => return text,
                Err(err) => {
                    tracing::error!("Error analyzing batch (attempt {attempt}/{attempts}): {err}");
                    if attempt >= attempts {
                        return failure_payload(&batch.paths(), attempts, &err.to_string());
                    }
                    let delay = self.retry.delay_for(attempt);
                    tracing::info!("Waiting {} seconds before retrying...", delay.as_secs_f64());
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

/// `{"files": {path: {"error": ..., "file_path": path}}}` for every path.
pub fn failure_payload(paths: &[String], attempts: u32, message: &str) -> String {
    let files: Map<String, Value> = paths
        .iter()
        .map(|path| {
            (
                path.clone(),
                json!({
                    "error": format!("Analysis failed after {attempts} attempts: {message}"),
                    "file_path": path,
                }),
            )
        })
        .collect();
    json!({ "files": files }).to_string()
}
