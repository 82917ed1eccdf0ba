//! Config file loading

use crate::domain::Config;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Section name accepted when settings are nested in a shared file.
const SECTION: &str = "codebase-summarizer";

const CANDIDATES: [&str; 4] = [
    "codebase-summarizer.toml",
    ".codebase-summarizer.toml",
    "codebase-summarizer.yml",
    "codebase-summarizer.yaml",
];

/// Load settings for a run over `root`.
///
/// An explicit `config_path` must exist and parse. A file found by
/// discovery that fails to parse only produces a warning and the defaults.
pub fn load_config(root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    match parse_config_file(&config_file) {
        Ok(cfg) => {
            tracing::debug!("Loaded configuration from {}", config_file.display());
            Ok(cfg)
        }
        Err(err) if explicit => Err(err),
        Err(err) => {
            tracing::warn!(
                "Ignoring auto-discovered config {}: {err:#}",
                config_file.display()
            );
            Ok(Config::default())
        }
    }
}

fn parse_config_file(config_file: &Path) -> Result<Config> {
    let content = fs::read_to_string(config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_config(&content, config_file),
        "yaml" | "yml" => parse_yaml_config(&content, config_file),
        other => Err(anyhow!(
            "Unsupported config extension '.{other}' for file {}",
            config_file.display()
        )),
    }
}

/// Parse TOML, reading from a `[codebase-summarizer]` table when present.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML, reading from a `codebase-summarizer:` mapping when present.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    // An empty file parses as null
    if raw.is_null() {
        return Ok(Config::default());
    }

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(root: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| root.join(candidate)).find(|path| path.is_file())
}
