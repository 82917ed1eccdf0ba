//! Layering command-line flags over file configuration.

use crate::domain::Config;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Settings given on the command line. `None` leaves the file or default value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub batch_size: Option<usize>,
    pub max_token_limit: Option<usize>,
    pub pause_seconds: Option<u64>,
    pub use_git: Option<bool>,
    pub optimization_model: Option<String>,
    pub ignore_file: Option<PathBuf>,
}

/// Apply `overrides` on top of `config` and check the result.
pub fn merge_cli_with_config(mut config: Config, overrides: CliOverrides) -> Result<Config> {
    if let Some(model) = overrides.model {
        config.model = model;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(limit) = overrides.max_token_limit {
        config.max_token_limit = limit;
    }
    if let Some(pause) = overrides.pause_seconds {
        config.pause_seconds = pause;
    }
    if let Some(use_git) = overrides.use_git {
        config.use_git = use_git;
    }
    if overrides.optimization_model.is_some() {
        config.optimization_model = overrides.optimization_model;
    }
    if overrides.ignore_file.is_some() {
        config.ignore_file = overrides.ignore_file;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.batch_size == 0 {
        bail!("batch_size must be at least 1");
    }
    if config.max_token_limit == 0 {
        bail!("max_token_limit must be greater than 0");
    }
    if config.model.trim().is_empty() {
        bail!("model must not be empty");
    }
    Ok(())
}
