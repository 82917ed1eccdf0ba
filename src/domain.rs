//! Core domain types shared across discovery, analysis, and output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4.1-nano-2025-04-14";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_MAX_TOKEN_LIMIT: usize = 50_000;
pub const DEFAULT_PAUSE_SECONDS: u64 = 0;
pub const DEFAULT_TRUNCATION_LIMIT: usize = 35_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Extensions treated as text without looking at file contents.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".html", ".css", ".json", ".md", ".txt", ".jsx", ".tsx", ".vue", ".yml",
    ".yaml", ".toml", ".ini", ".cfg", ".sh", ".bash", ".c", ".cpp", ".h", ".hpp", ".java", ".go",
    ".rb", ".php", ".swift", ".rs", ".scala", ".sql", ".xml",
];

/// How discovery classified a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    Included,
    Ignored,
    Binary,
}

/// A file seen during discovery. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Root-relative path with forward slashes. Also the canonical analysis key.
    pub relative_path: String,
    pub class: FileClass,
    pub size_bytes: u64,
}

impl FileRecord {
    pub fn is_included(&self) -> bool {
        self.class == FileClass::Included
    }
}

/// Counts gathered while classifying discovered files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub files_included: usize,
    pub files_ignored: usize,
    pub files_binary: usize,
    pub total_bytes_included: u64,
}

impl DiscoveryStats {
    pub fn from_records(files: &[FileRecord]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match file.class {
                FileClass::Included => {
                    stats.files_included += 1;
                    stats.total_bytes_included += file.size_bytes;
                }
                FileClass::Ignored => stats.files_ignored += 1,
                FileClass::Binary => stats.files_binary += 1,
            }
        }
        stats
    }
}

/// Run configuration after merging defaults, config file, and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: String,
    pub batch_size: usize,
    pub max_token_limit: usize,
    pub pause_seconds: u64,
    pub use_git: bool,
    pub truncation_limit: usize,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub optimization_model: Option<String>,
    pub ignore_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_token_limit: DEFAULT_MAX_TOKEN_LIMIT,
            pause_seconds: DEFAULT_PAUSE_SECONDS,
            use_git: true,
            truncation_limit: DEFAULT_TRUNCATION_LIMIT,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            optimization_model: None,
            ignore_file: None,
        }
    }
}
