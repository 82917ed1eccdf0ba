//! The sequential batch loop.
//!
//! Each batch goes through budget allocation, the summarizer, and the merger,
//! and the document on disk is rewritten after every one of them.

use crate::analyze::{allocate, batch_count, load_batch_file, Batch, BatchAnalyzer, RetryPolicy};
use crate::domain::{Config, DiscoveryStats, FileRecord};
use crate::llm::Summarizer;
use crate::output::document::{timestamp, CompletionStatus, Metadata};
use crate::output::{merge_batch, AggregateDocument, MergeOutcome, OutputStore};
use crate::scan::Discovery;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Map;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loop settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub batch_size: usize,
    pub max_token_limit: usize,
    pub truncation_limit: usize,
    pub pause: Duration,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batch_size,
            max_token_limit: config.max_token_limit,
            truncation_limit: config.truncation_limit,
            pause: Duration::from_secs(config.pause_seconds),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                initial_delay: Duration::from_secs(config.retry_delay_secs),
            },
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub total_files: usize,
    pub total_batches: usize,
    pub files_analyzed: usize,
    /// Batches whose response could not be used and were stored as error entries.
    pub failed_batches: usize,
}

/// Starting document for a run over `discovery`.
pub fn build_template(root: &Path, discovery: &Discovery, options: &PipelineOptions, model: &str) -> AggregateDocument {
    let stats = DiscoveryStats::from_records(&discovery.files);
    let metadata = Metadata {
        generated_at: timestamp(),
        total_files: stats.files_included,
        directory: root.display().to_string(),
        completion_status: CompletionStatus::InProgress,
        total_codebase_size_bytes: stats.total_bytes_included,
        max_token_limit: options.max_token_limit,
        discovery_strategy: Some(discovery.strategy.to_string()),
        model: Some(model.to_string()),
        completed_batches: Some(0),
        total_batches: Some(batch_count(stats.files_included, options.batch_size)),
        files_analyzed: Some(0),
        completion_time: None,
        extra: Map::new(),
    };
    AggregateDocument::new(metadata, discovery.tree.clone())
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} batches {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Whether to sleep after batch `index` (1-based) of `total`. Never after the last one.
pub fn should_pause(index: usize, total: usize, pause: Duration) -> bool {
    index < total && !pause.is_zero()
}

/// Analyze every included file of `discovery` and write the document to `output`.
pub fn run(
    root: &Path,
    discovery: &Discovery,
    summarizer: &dyn Summarizer,
    options: &PipelineOptions,
    output: &Path,
) -> Result<RunSummary> {
    if options.batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let included: Vec<&FileRecord> = discovery.included().collect();
    let total_bytes: u64 = included.iter().map(|f| f.size_bytes).sum();
    let total_batches = batch_count(included.len(), options.batch_size);

    let store = OutputStore::new(output, build_template(root, discovery, options, summarizer.model()));
    store.initialize()?;

    if included.is_empty() {
        tracing::warn!("No files to analyze under {}", root.display());
    }
    tracing::info!(
        "Processing {} files in {total_batches} batches (batch size {})",
        included.len(),
        options.batch_size
    );

    let analyzer = BatchAnalyzer::new(summarizer, options.retry, options.truncation_limit);
    let bar = progress_bar(total_batches, options.show_progress);
    let mut failed_batches = 0;

    for (i, chunk) in included.chunks(options.batch_size).enumerate() {
        let index = i + 1;
        let mut batch = Batch {
            index,
            total: total_batches,
            files: chunk.iter().map(|record| load_batch_file(record)).collect(),
            token_budget: 0,
        };
        batch.token_budget = allocate(batch.byte_size(), total_bytes, options.max_token_limit);
        bar.set_message(format!("{} files, budget {}", batch.files.len(), batch.token_budget));
        tracing::info!(
            "Batch {index}/{total_batches}: {} files, {} bytes, token budget {}",
            batch.files.len(),
            batch.byte_size(),
            batch.token_budget
        );

        let raw = analyzer.analyze(&batch);

        let mut doc = store.load();
        let outcome = merge_batch(&mut doc, &raw, &batch.paths(), index, total_batches);
        if let MergeOutcome::Fallback { reason } = &outcome {
            tracing::warn!("Batch {index}/{total_batches} stored as errors: {reason}");
            failed_batches += 1;
        }
        if let Err(err) = store.save(&doc) {
            tracing::error!("Error updating output file after batch {index}: {err:#}");
        }
        bar.inc(1);

        if should_pause(index, total_batches, options.pause) {
            tracing::info!("Pausing for {:.1} seconds before next batch...", options.pause.as_secs_f64());
            std::thread::sleep(options.pause);
        }
    }

    bar.finish_and_clear();
    let doc = store.finalize()?;

    Ok(RunSummary {
        output: output.to_path_buf(),
        total_files: included.len(),
        total_batches,
        files_analyzed: doc.file_analyses.len(),
        failed_batches,
    })
}
