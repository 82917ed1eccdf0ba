//! Directory tree generation.
//!
//! Both renderers share one grammar: a `name/` header, `├── `/`└── `
//! connectors, `│   `/`    ` indentation, directories suffixed with `/`, and
//! entries sorted by name at every level.

use crate::scan::filter::{is_ignored, IgnoreRule};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const VCS_DIR: &str = ".git";

/// A node in the path trie. `None` children mark a file.
#[derive(Debug, Default)]
struct TreeNode {
    children: BTreeMap<String, Option<TreeNode>>,
}

impl TreeNode {
    fn insert(&mut self, rel_path: &str) {
        let parts: Vec<&str> = rel_path.split('/').filter(|p| !p.is_empty()).collect();
        let Some((file, dirs)) = parts.split_last() else {
            return;
        };

        let mut current = self;
        for dir in dirs {
            let slot = current.children.entry((*dir).to_string()).or_insert_with(|| Some(TreeNode::default()));
            if slot.is_none() {
                // A path listed both as a file and as a directory; the directory wins.
                *slot = Some(TreeNode::default());
            }
            current = match slot {
                Some(node) => node,
                None => return,
            };
        }
        current.children.entry((*file).to_string()).or_insert(None);
    }

    fn render(&self, prefix: &str, lines: &mut Vec<String>) {
        let total = self.children.len();
        for (idx, (name, child)) in self.children.iter().enumerate() {
            let is_last = idx + 1 == total;
            let connector = if is_last { "└── " } else { "├── " };
            match child {
                Some(node) => {
                    lines.push(format!("{prefix}{connector}{name}/"));
                    let extension = if is_last { "    " } else { "│   " };
                    node.render(&format!("{prefix}{extension}"), lines);
                }
                None => lines.push(format!("{prefix}{connector}{name}")),
            }
        }
    }
}

fn root_name(root_path: &Path) -> String {
    root_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Render a tree from already-filtered root-relative paths (e.g. from git).
pub fn render_path_tree<S: AsRef<str>>(root_name: &str, paths: &[S]) -> String {
    let mut trie = TreeNode::default();
    for path in paths {
        trie.insert(path.as_ref());
    }

    let mut lines = vec![format!("{root_name}/")];
    trie.render("", &mut lines);
    lines.join("\n")
}

/// Walk the filesystem and render every entry not excluded by `rules`.
///
/// Ignored directories are pruned before descent, so their subtrees are never
/// visited.
pub fn render_walk_tree(root_path: &Path, rules: &[IgnoreRule]) -> String {
    tracing::debug!("Generating file tree manually for {}", root_path.display());
    let mut lines = vec![format!("{}/", root_name(root_path))];
    walk_tree(root_path, root_path, "", rules, &mut lines);
    lines.join("\n")
}

fn walk_tree(
    root_path: &Path,
    current_path: &Path,
    prefix: &str,
    rules: &[IgnoreRule],
    lines: &mut Vec<String>,
) {
    let read_dir = match fs::read_dir(current_path) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("Cannot read directory {}: {}", current_path.display(), err);
            return;
        }
    };

    let mut entries: Vec<(String, bool, std::path::PathBuf)> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let file_type = entry.file_type().ok()?;
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            let is_dir = file_type.is_dir() || (file_type.is_symlink() && path.is_dir());

            if is_dir && name == VCS_DIR {
                return None;
            }
            if is_ignored(&path, root_path, rules) {
                return None;
            }

            Some((name, is_dir, path))
        })
        .collect();

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let total_entries = entries.len();
    for (idx, (name, is_dir, path)) in entries.into_iter().enumerate() {
        let is_last = idx + 1 == total_entries;
        let connector = if is_last { "└── " } else { "├── " };

        if is_dir {
            lines.push(format!("{prefix}{connector}{name}/"));
            let extension = if is_last { "    " } else { "│   " };
            if !path.is_symlink() {
                walk_tree(root_path, &path, &format!("{prefix}{extension}"), rules, lines);
            }
        } else {
            lines.push(format!("{prefix}{connector}{name}"));
        }
    }
}
