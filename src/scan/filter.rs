//! Gitignore-style ignore rules.
//!
//! Matching is deliberately simplified: a rule matches when the root-relative
//! path matches the pattern, or matches `*/pattern`, using `fnmatch`-like globs
//! where `*` also crosses `/`. The last matching rule decides.

use crate::utils::relative_path;
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::Path;

/// A single parsed ignore line.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    negated: bool,
    direct: GlobMatcher,
    nested: GlobMatcher,
}

impl IgnoreRule {
    /// Parse one ignore line. Returns `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let pattern = body.trim_start_matches('/').trim_end_matches('/').to_string();
        if pattern.is_empty() {
            return Ok(None);
        }

        let direct = compile(&pattern)?;
        let nested = compile(&format!("*/{pattern}"))?;
        Ok(Some(Self { negated, direct, nested }))
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Does this rule match a root-relative, forward-slash path?
    pub fn matches(&self, rel_path: &str) -> bool {
        self.direct.is_match(rel_path) || self.nested.is_match(rel_path)
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(false)
        .backslash_escape(true)
        .build()
        .with_context(|| format!("Invalid ignore pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Parse ignore rules from text, skipping patterns that do not compile.
pub fn parse_patterns(content: &str) -> Vec<IgnoreRule> {
    content
        .lines()
        .filter_map(|line| match IgnoreRule::parse(line) {
            Ok(rule) => rule,
            Err(err) => {
                tracing::warn!("Skipping ignore pattern: {err:#}");
                None
            }
        })
        .collect()
}

/// Load rules from an ignore file. A missing file yields no rules.
pub fn load_patterns(path: &Path) -> Result<Vec<IgnoreRule>> {
    if !path.exists() {
        tracing::info!("No ignore file found at {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed reading ignore file: {}", path.display()))?;
    let rules = parse_patterns(&content);
    tracing::debug!("Loaded {} ignore rules from {}", rules.len(), path.display());
    Ok(rules)
}

/// Rules for a run: the root `.gitignore`, then the custom ignore file if given.
///
/// A custom file that does not exist is a configuration error.
pub fn load_ignore_rules(root: &Path, custom: Option<&Path>) -> Result<Vec<IgnoreRule>> {
    let mut rules = load_patterns(&root.join(".gitignore"))?;

    if let Some(custom_path) = custom {
        if !custom_path.is_file() {
            anyhow::bail!("Custom ignore file not found: {}", custom_path.display());
        }
        rules.extend(load_patterns(custom_path)?);
    }

    Ok(rules)
}

fn verdict(rel_path: &str, rules: &[IgnoreRule]) -> Option<bool> {
    rules.iter().rev().find(|rule| rule.matches(rel_path)).map(|rule| !rule.is_negated())
}

/// Whether `rel_path` (root-relative, forward slashes) is ignored.
///
/// Ancestor directories are checked first: nothing beneath an ignored
/// directory can be re-included.
pub fn is_ignored_relative(rel_path: &str, rules: &[IgnoreRule]) -> bool {
    if rules.is_empty() || rel_path.is_empty() {
        return false;
    }

    let mut end = 0;
    while let Some(offset) = rel_path[end..].find('/') {
        let ancestor = &rel_path[..end + offset];
        if verdict(ancestor, rules) == Some(true) {
            return true;
        }
        end += offset + 1;
    }

    verdict(rel_path, rules).unwrap_or(false)
}

/// Whether `file_path` is ignored relative to `root_path`.
pub fn is_ignored(file_path: &Path, root_path: &Path, rules: &[IgnoreRule]) -> bool {
    is_ignored_relative(&relative_path(file_path, root_path), rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn rules(lines: &[&str]) -> Vec<IgnoreRule> {
        parse_patterns(&lines.join("\n"))
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let parsed = rules(&["", "# comment", "   ", "*.log", "!keep.log"]);
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].matches("server.log"));
        assert!(!parsed[0].is_negated());
        assert!(parsed[1].matches("keep.log"));
        assert!(!parsed[1].matches("server.log"));
        assert!(parsed[1].is_negated());
    }

    #[test]
    fn test_star_pattern_matches_nested_file() {
        let root = PathBuf::from("/repo");
        let parsed = rules(&["*.log"]);
        assert!(is_ignored(&root.join("build").join("app.log"), &root, &parsed));
        assert!(is_ignored(&root.join("app.log"), &root, &parsed));
        assert!(!is_ignored(&root.join("app.py"), &root, &parsed));
    }

    #[test]
    fn test_later_negation_unignores_exactly_that_file() {
        let root = PathBuf::from("/repo");
        let parsed = rules(&["*.log", "!keep.log"]);
        assert!(!is_ignored(&root.join("keep.log"), &root, &parsed));
        assert!(is_ignored(&root.join("other.log"), &root, &parsed));
        assert!(is_ignored(&root.join("keep.log.bak.log"), &root, &parsed));
    }

    #[test]
    fn test_earlier_negation_is_overridden() {
        let parsed = rules(&["!keep.log", "*.log"]);
        assert!(is_ignored_relative("keep.log", &parsed));
    }

    #[test]
    fn test_is_ignored_is_idempotent() {
        let parsed = rules(&["target", "*.tmp", "!important.tmp", "docs/*.md"]);
        for rel in ["target/debug/x", "a/b.tmp", "important.tmp", "docs/x.md", "src/lib.rs"] {
            let first = is_ignored_relative(rel, &parsed);
            let second = is_ignored_relative(rel, &parsed);
            assert_eq!(first, second, "verdict changed for {rel}");
        }
    }

    #[test]
    fn test_directory_pattern_covers_contents() {
        let parsed = rules(&["node_modules/"]);
        assert!(is_ignored_relative("node_modules", &parsed));
        assert!(is_ignored_relative("node_modules/react/index.js", &parsed));
        assert!(is_ignored_relative("web/node_modules/x.js", &parsed));
        assert!(!is_ignored_relative("src/node_modules_helper.js", &parsed));
    }

    #[test]
    fn test_no_rules_ignores_nothing() {
        assert!(!is_ignored_relative("anything/at/all.bin", &[]));
    }

    #[test]
    fn test_load_patterns_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_patterns(&tmp.path().join(".gitignore")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_ignore_rules_appends_custom_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(".gitignore"), "*.log\n").unwrap();
        let custom = tmp.path().join("extra.ignore");
        std::fs::write(&custom, "!keep.log\n").unwrap();

        let loaded = load_ignore_rules(tmp.path(), Some(&custom)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(!is_ignored_relative("keep.log", &loaded));
    }

    #[test]
    fn test_load_ignore_rules_missing_custom_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.ignore");
        assert!(load_ignore_rules(tmp.path(), Some(&missing)).is_err());
    }
}
