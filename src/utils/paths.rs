//! Path normalization

use std::path::Path;

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// Root-relative path with forward slashes. Falls back to the full path when
/// `path` is not under `root`.
pub fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    normalize_path(&rel.to_string_lossy())
}
