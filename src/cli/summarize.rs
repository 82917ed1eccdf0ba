//! Summarize command implementation

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use console::style;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::info::{discover_directory, print_exclusions, print_summary};
use super::utils::{default_output_path, optimized_output_path, resolve_api_key, resolve_directory};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::llm::{OpenAiSummarizer, Summarizer};
use crate::output::{optimize_file, OptimizeOutcome};
use crate::pipeline::{self, PipelineOptions};

#[derive(Args)]
pub struct SummarizeArgs {
    /// Directory to analyze
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Output JSON file (default: processed-codebase_<timestamp>.json)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Model used for batch analysis
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Extra gitignore-style file applied after the root .gitignore
    #[arg(short = 'g', long, value_name = "FILE")]
    pub ignore_file: Option<PathBuf>,

    /// List ignored and binary files and ask before analyzing
    #[arg(short = 'p', long)]
    pub preview: bool,

    /// API key (falls back to OPENAI_API_KEY, then a prompt)
    #[arg(short = 'k', long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Files per summarizer call
    #[arg(short = 'b', long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Ask git for the file list when the directory is a repository (default)
    #[arg(long, overrides_with = "no_git")]
    pub use_git: bool,

    /// Walk the filesystem instead of asking git for the file list
    #[arg(long, overrides_with = "use_git")]
    pub no_git: bool,

    /// Response token ceiling shared across batches in proportion to their size
    #[arg(short = 't', long, value_name = "TOKENS")]
    pub max_token_limit: Option<usize>,

    /// Seconds to wait between batches
    #[arg(long, value_name = "SECONDS")]
    pub pause_seconds: Option<u64>,

    /// Run the compression pass on the finished document
    #[arg(long)]
    pub optimize: bool,

    /// Where the compressed document goes (default: <output stem>_optimized.<ext>)
    #[arg(long, value_name = "FILE")]
    pub optimized_output: Option<PathBuf>,

    /// Model used for the compression pass (default: the analysis model)
    #[arg(long, value_name = "MODEL")]
    pub optimization_model: Option<String>,

    /// Path to config file (codebase-summarizer.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl SummarizeArgs {
    fn use_git_override(&self) -> Option<bool> {
        if self.no_git {
            Some(false)
        } else if self.use_git {
            Some(true)
        } else {
            None
        }
    }
}

pub fn run(args: SummarizeArgs) -> Result<()> {
    let start_time = Instant::now();
    let root = resolve_directory(&args.directory)?;

    let file_config = load_config(&root, args.config.as_deref())?;
    let config = merge_cli_with_config(
        file_config,
        CliOverrides {
            model: args.model.clone(),
            batch_size: args.batch_size,
            max_token_limit: args.max_token_limit,
            pause_seconds: args.pause_seconds,
            use_git: args.use_git_override(),
            optimization_model: args.optimization_model.clone(),
            ignore_file: args.ignore_file.clone(),
        },
    )?;

    let discovery = discover_directory(&root, &config)?;

    if args.preview {
        print_summary(&root, &discovery);
        println!();
        print_exclusions(&discovery);
        println!();
        let proceed = Confirm::new()
            .with_prompt("Proceed with analysis?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !proceed {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let api_key = resolve_api_key(args.api_key.clone())?;
    let summarizer = OpenAiSummarizer::new(
        &config.api_base,
        &api_key,
        &config.model,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let output = args.output.clone().unwrap_or_else(|| default_output_path(Local::now()));
    let mut options = PipelineOptions::from_config(&config);
    options.show_progress = std::io::stderr().is_terminal();

    let summary = pipeline::run(&root, &discovery, &summarizer, &options, &output)?;

    println!(
        "{} Analyzed {} of {} files in {} batches ({:.1}s)",
        style("✓").green().bold(),
        summary.files_analyzed,
        summary.total_files,
        summary.total_batches,
        start_time.elapsed().as_secs_f64()
    );
    if summary.failed_batches > 0 {
        println!(
            "{} {} batches returned unusable responses; see the error entries",
            style("!").yellow().bold(),
            summary.failed_batches
        );
    }
    println!("Output written to {}", summary.output.display());

    if args.optimize {
        let optimized = args.optimized_output.clone().unwrap_or_else(|| optimized_output_path(&output));
        let model = config.optimization_model.as_deref().unwrap_or(&config.model);
        let optimizer = summarizer.with_model(model);
        let outcome = optimize_file(&optimizer, &output, &optimized)?;
        report_optimization(&outcome, &optimized, optimizer.model());
    }

    Ok(())
}

pub(super) fn report_optimization(outcome: &OptimizeOutcome, path: &std::path::Path, model: &str) {
    match outcome {
        OptimizeOutcome::Accepted { original_size, optimized_size } => println!(
            "{} Optimized with {model}: {original_size} -> {optimized_size} bytes, written to {}",
            style("✓").green().bold(),
            path.display()
        ),
        OptimizeOutcome::Rejected { reason } => println!(
            "{} Optimization kept the original document ({reason}), written to {}",
            style("!").yellow().bold(),
            path.display()
        ),
    }
}
