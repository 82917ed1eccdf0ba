//! On-disk aggregate document.
//!
//! The store holds no state beyond its path and the template used to seed a
//! fresh document. Every mutation is a load, a change, and a full rewrite, so
//! the file on disk is always a complete document.

use crate::output::document::AggregateDocument;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct OutputStore {
    path: PathBuf,
    template: AggregateDocument,
}

impl OutputStore {
    pub fn new(path: impl Into<PathBuf>, template: AggregateDocument) -> Self {
        Self { path: path.into(), template }
    }

    /// Write the template as the starting document.
    pub fn initialize(&self) -> Result<()> {
        self.save(&self.template)?;
        tracing::info!("Initialized output file {}", self.path.display());
        Ok(())
    }

    /// Current document on disk.
    ///
    /// A missing or unparseable file is logged and replaced by a fresh copy
    /// of the template.
    pub fn load(&self) -> AggregateDocument {
        match self.try_load() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::error!("Error reading {}: {err:#}; starting from template", self.path.display());
                self.template.clone()
            }
        }
    }

    fn try_load(&self) -> Result<AggregateDocument> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("invalid document in {}", self.path.display()))
    }

    /// Replace the file with `doc`, pretty-printed.
    pub fn save(&self, doc: &AggregateDocument) -> Result<()> {
        let json = doc.to_pretty_json().context("failed to serialize document")?;
        write_atomic(&self.path, &json)
    }

    /// Mark the on-disk document completed and rewrite it.
    pub fn finalize(&self) -> Result<AggregateDocument> {
        let mut doc = self.load();
        doc.mark_completed();
        self.save(&doc)?;
        tracing::info!("Finalized output file {}", self.path.display());
        Ok(doc)
    }
}

/// Write to a sibling temp file, then rename it over `path`.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .with_context(|| format!("output path has no file name: {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
