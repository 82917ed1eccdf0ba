//! The persisted aggregate document.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const REQUIRED_TOP_LEVEL_KEYS: [&str; 3] = ["metadata", "file_tree", "file_analyses"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_at: String,
    pub total_files: usize,
    pub directory: String,
    pub completion_status: CompletionStatus,
    pub total_codebase_size_bytes: u64,
    pub max_token_limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_batches: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_batches: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_analyzed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<String>,
    /// Keys this version does not know about, preserved across rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `metadata`, `file_tree`, and `file_analyses`. `file_analyses` is a map so
/// it always serializes as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub metadata: Metadata,
    pub file_tree: String,
    #[serde(default)]
    pub file_analyses: BTreeMap<String, Value>,
}

impl AggregateDocument {
    pub fn new(metadata: Metadata, file_tree: String) -> Self {
        Self { metadata, file_tree, file_analyses: BTreeMap::new() }
    }

    pub fn is_completed(&self) -> bool {
        self.metadata.completion_status == CompletionStatus::Completed
    }

    /// Flip to `completed` and stamp the completion time.
    pub fn mark_completed(&mut self) {
        self.metadata.completion_status = CompletionStatus::Completed;
        self.metadata.completion_time = Some(timestamp());
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Local wall-clock timestamp used throughout the document.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
