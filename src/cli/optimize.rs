//! Optimize command implementation

use anyhow::{bail, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::summarize::report_optimization;
use super::utils::{optimized_output_path, resolve_api_key};
use crate::config::load_config;
use crate::llm::OpenAiSummarizer;
use crate::output::optimize_file;

#[derive(Args)]
pub struct OptimizeArgs {
    /// Existing summary document
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (default: <input stem>_optimized.<ext>)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Model used for the compression pass
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// API key (falls back to OPENAI_API_KEY, then a prompt)
    #[arg(short = 'k', long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Path to config file (codebase-summarizer.toml or .yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: OptimizeArgs) -> Result<()> {
    if !args.input.is_file() {
        bail!("Input file not found: {}", args.input.display());
    }

    let anchor = args.input.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let config = load_config(anchor, args.config.as_deref())?;
    let model = args
        .model
        .clone()
        .or_else(|| config.optimization_model.clone())
        .unwrap_or_else(|| config.model.clone());

    let output = args.output.clone().unwrap_or_else(|| optimized_output_path(&args.input));
    let api_key = resolve_api_key(args.api_key.clone())?;
    let summarizer = OpenAiSummarizer::new(
        &config.api_base,
        &api_key,
        &model,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let outcome = optimize_file(&summarizer, &args.input, &output)?;
    report_optimization(&outcome, &output, &model);
    Ok(())
}
