//! Version-control collaborator used for exact gitignore semantics.

use crate::utils::normalize_path;
use anyhow::{Context, Result};
use git2::{Repository, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Source of an authoritative file list for a directory.
pub trait VersionControl {
    /// Is `root` inside a work tree this collaborator understands?
    fn is_repository(&self, root: &Path) -> bool;

    /// Tracked plus untracked-but-not-excluded files, relative to `root`,
    /// forward slashes, sorted.
    fn list_files(&self, root: &Path) -> Result<Vec<String>>;
}

/// `git2`-backed collaborator, equivalent to
/// `git ls-files --cached --others --exclude-standard` run inside `root`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepository;

impl GitRepository {
    fn open(root: &Path) -> Result<(Repository, PathBuf)> {
        let repo = Repository::discover(root)
            .with_context(|| format!("Not a git repository: {}", root.display()))?;
        let workdir = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("Repository at {} is bare", root.display()))?;
        Ok((repo, workdir))
    }
}

impl VersionControl for GitRepository {
    fn is_repository(&self, root: &Path) -> bool {
        Repository::discover(root).map(|repo| !repo.is_bare()).unwrap_or(false)
    }

    fn list_files(&self, root: &Path) -> Result<Vec<String>> {
        let (repo, workdir) = Self::open(root)?;
        let workdir = workdir.canonicalize().unwrap_or(workdir);
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        // Paths from git are relative to the work tree; keep only those under root.
        let scope = match root.strip_prefix(&workdir) {
            Ok(rel) => normalize_path(&rel.to_string_lossy()),
            Err(_) => String::new(),
        };
        let scope_prefix = if scope.is_empty() { String::new() } else { format!("{scope}/") };

        let mut paths = BTreeSet::new();

        let index = repo.index().context("Failed to read git index")?;
        for entry in index.iter() {
            paths.insert(String::from_utf8_lossy(&entry.path).to_string());
        }

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = repo.statuses(Some(&mut opts)).context("Failed to read git status")?;
        for status in statuses.iter() {
            if status.status().is_wt_new() {
                if let Some(path) = status.path() {
                    paths.insert(path.to_string());
                }
            }
        }

        let files: Vec<String> = paths
            .into_iter()
            .filter_map(|path| {
                let path = normalize_path(&path);
                if scope_prefix.is_empty() {
                    Some(path)
                } else {
                    path.strip_prefix(&scope_prefix).map(str::to_string)
                }
            })
            .collect();

        tracing::debug!("Found {} files from git", files.len());
        Ok(files)
    }
}
