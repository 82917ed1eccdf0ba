//! File discovery strategies.
//!
//! A strategy enumerates candidate files under a root, classifies each one, and
//! renders the matching directory tree. The strategy is chosen once per run.

use crate::domain::{FileClass, FileRecord};
use crate::scan::filter::{is_ignored_relative, IgnoreRule};
use crate::scan::git::VersionControl;
use crate::scan::tree::{render_path_tree, render_walk_tree};
use crate::utils::{is_text_file, relative_path};
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of discovering a directory.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Every candidate file, sorted by relative path.
    pub files: Vec<FileRecord>,
    pub tree: String,
    pub strategy: &'static str,
    /// Directories skipped entirely because an ignore rule matched them.
    pub ignored_dirs: Vec<String>,
}

impl Discovery {
    pub fn included(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|f| f.is_included())
    }
}

pub trait DiscoveryStrategy {
    fn name(&self) -> &'static str;
    fn discover(&self, root: &Path) -> Result<Discovery>;
}

fn file_size(path: &Path) -> u64 {
    match path.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            tracing::warn!("Could not get size of {}: {}", path.display(), err);
            0
        }
    }
}

fn classify_text(path: PathBuf, relative: String) -> FileRecord {
    let class = if is_text_file(&path) { FileClass::Included } else { FileClass::Binary };
    let size_bytes = file_size(&path);
    FileRecord { path, relative_path: relative, class, size_bytes }
}

/// Trusts the version-control file list; only text/binary is decided here.
pub struct VcsDiscovery<'a> {
    vcs: &'a dyn VersionControl,
}

impl<'a> VcsDiscovery<'a> {
    pub fn new(vcs: &'a dyn VersionControl) -> Self {
        Self { vcs }
    }
}

impl DiscoveryStrategy for VcsDiscovery<'_> {
    fn name(&self) -> &'static str {
        "git"
    }

    fn discover(&self, root: &Path) -> Result<Discovery> {
        let listed = self.vcs.list_files(root)?;

        let mut kept = Vec::with_capacity(listed.len());
        let mut files = Vec::with_capacity(listed.len());
        for rel in listed {
            let path = root.join(&rel);
            if !path.is_file() {
                tracing::debug!("Skipping listed path that is not a file on disk: {rel}");
                continue;
            }
            files.push(classify_text(path, rel.clone()));
            kept.push(rel);
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let tree = render_path_tree(&root_display_name(root), &kept);
        Ok(Discovery { files, tree, strategy: self.name(), ignored_dirs: Vec::new() })
    }
}

/// Recursive filesystem walk applying ignore rules and text classification.
pub struct WalkDiscovery<'a> {
    rules: &'a [IgnoreRule],
}

impl<'a> WalkDiscovery<'a> {
    pub fn new(rules: &'a [IgnoreRule]) -> Self {
        Self { rules }
    }
}

impl DiscoveryStrategy for WalkDiscovery<'_> {
    fn name(&self) -> &'static str {
        "walk"
    }

    fn discover(&self, root: &Path) -> Result<Discovery> {
        let mut files = Vec::new();
        let mut ignored_dirs = Vec::new();

        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter();
        let walker = walker.filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            if entry.file_name() == ".git" {
                return false;
            }
            let rel = relative_path(entry.path(), root);
            if is_ignored_relative(&rel, self.rules) {
                ignored_dirs.push(rel);
                return false;
            }
            true
        });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            // Linked directories show in the tree but are not descended into.
            if entry.path_is_symlink() && entry.path().is_dir() {
                tracing::debug!("Skipping directory symlink {}", entry.path().display());
                continue;
            }

            let path = entry.into_path();
            let rel = relative_path(&path, root);
            if is_ignored_relative(&rel, self.rules) {
                let size_bytes = file_size(&path);
                files.push(FileRecord {
                    path,
                    relative_path: rel,
                    class: FileClass::Ignored,
                    size_bytes,
                });
            } else {
                files.push(classify_text(path, rel));
            }
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let tree = render_walk_tree(root, self.rules);
        Ok(Discovery { files, tree, strategy: self.name(), ignored_dirs })
    }
}

fn root_display_name(root: &Path) -> String {
    root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| ".".to_string())
}

/// Pick a strategy once and run it.
///
/// Version-control discovery is used when requested and available; on failure
/// or an empty listing the run falls back to the filesystem walk.
pub fn discover(
    root: &Path,
    rules: &[IgnoreRule],
    vcs: Option<&dyn VersionControl>,
) -> Result<Discovery> {
    let walk = WalkDiscovery::new(rules);

    let Some(vcs) = vcs else {
        tracing::info!("Using manual file scanning (version control disabled)");
        return walk.discover(root);
    };

    if !vcs.is_repository(root) {
        tracing::info!("Not a git repository. Using manual file discovery.");
        return walk.discover(root);
    }

    match VcsDiscovery::new(vcs).discover(root) {
        Ok(found) if !found.files.is_empty() => {
            tracing::info!("Using git to identify {} files", found.files.len());
            Ok(found)
        }
        Ok(_) => {
            tracing::info!("Git listed no files; falling back to manual file scanning");
            walk.discover(root)
        }
        Err(err) => {
            tracing::info!("Error getting git files ({err:#}); falling back to manual file scanning");
            walk.discover(root)
        }
    }
}
