//! Shared CLI utilities.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use dialoguer::Password;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Canonical form of a directory argument. Fails when it is missing or not a directory.
pub fn resolve_directory(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Directory not found: {}", path.display()))?;
    if !root.is_dir() {
        bail!("Path is not a directory: {}", root.display());
    }
    Ok(root)
}

/// Locate a custom ignore file: as given first, then relative to `root`.
pub fn resolve_ignore_file(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// `processed-codebase_<YYYYmmdd_HHMMSS>.json`
pub fn default_output_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("processed-codebase_{}.json", now.format("%Y%m%d_%H%M%S")))
}

/// `<stem>_optimized.<ext>` next to `output`.
pub fn optimized_output_path(output: &Path) -> PathBuf {
    let stem = output.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_optimized.{}", ext.to_string_lossy()),
        None => format!("{stem}_optimized"),
    };
    output.with_file_name(name)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Credential from the flag, then the environment, then a hidden prompt.
pub fn resolve_api_key(flag: Option<String>) -> Result<String> {
    if let Some(key) = non_empty(flag) {
        return Ok(key);
    }
    if let Some(key) = non_empty(std::env::var(API_KEY_ENV).ok()) {
        tracing::debug!("Using API key from {API_KEY_ENV}");
        return Ok(key);
    }
    if !std::io::stdin().is_terminal() {
        bail!("No API key provided. Use --api-key or set {API_KEY_ENV}");
    }

    let entered: String = Password::new()
        .with_prompt("Enter your OpenAI API key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;
    match non_empty(Some(entered)) {
        Some(key) => Ok(key),
        None => bail!("No API key provided. Use --api-key or set {API_KEY_ENV}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_default_output_path_uses_timestamp() {
        let now = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_output_path(now), PathBuf::from("processed-codebase_20260309_140507.json"));
    }

    #[test]
    fn test_optimized_output_path() {
        assert_eq!(optimized_output_path(Path::new("out/summary.json")), PathBuf::from("out/summary_optimized.json"));
        assert_eq!(optimized_output_path(Path::new("summary")), PathBuf::from("summary_optimized"));
    }

    #[test]
    fn test_flag_key_wins() {
        assert_eq!(resolve_api_key(Some("  sk-test ".to_string())).unwrap(), "sk-test");
    }

    #[test]
    fn test_resolve_directory_rejects_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(resolve_directory(&file).is_err());
        assert!(resolve_directory(&tmp.path().join("missing")).is_err());
        assert!(resolve_directory(tmp.path()).is_ok());
    }

    #[test]
    fn test_ignore_file_falls_back_to_root() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolve_ignore_file(Path::new("no-such-ignore-file-here"), tmp.path());
        assert_eq!(resolved, tmp.path().join("no-such-ignore-file-here"));
    }
}
