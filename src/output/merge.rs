//! Folding batch responses into the aggregate document.

use crate::output::document::AggregateDocument;
use crate::output::repair::parse_with_repair;
use crate::utils::normalize_path;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse analysis";
pub const MISSING_MESSAGE: &str = "File missing from analysis response";

/// What happened to one batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The response parsed. `stored` entries were written, `dropped` pruned to
    /// nothing, `malformed` were not objects, and `missing` batch files had no
    /// entry at all.
    Parsed { stored: usize, dropped: usize, malformed: usize, missing: usize },
    /// Unusable response; every batch path received an error entry.
    Fallback { reason: String },
}

/// Recursively drop `null`, `""`, `[]`, and `{}`. Returns `None` when nothing is left.
pub fn prune_empty(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) => {
            let kept: Vec<Value> = items.into_iter().filter_map(prune_empty).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        Value::Object(map) => {
            let kept: Map<String, Value> =
                map.into_iter().filter_map(|(k, v)| prune_empty(v).map(|v| (k, v))).collect();
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        other => Some(other),
    }
}

/// Map a response key onto one of the batch's root-relative paths.
///
/// Exact match, then a unique `…/key` suffix match, then a unique file-name
/// match. Unmatched keys are kept (normalized) as given.
pub fn canonical_key(raw_key: &str, batch_paths: &[String]) -> String {
    let key = normalize_path(raw_key.trim());
    let key = key.trim_start_matches("./").to_string();

    if batch_paths.iter().any(|p| *p == key) {
        return key;
    }

    let suffix = format!("/{key}");
    let by_suffix: Vec<&String> = batch_paths.iter().filter(|p| p.ends_with(&suffix)).collect();
    if let [only] = by_suffix.as_slice() {
        return (*only).clone();
    }

    let name = key.rsplit('/').next().unwrap_or(&key);
    let by_name: Vec<&String> =
        batch_paths.iter().filter(|p| p.rsplit('/').next() == Some(name)).collect();
    if let [only] = by_name.as_slice() {
        return (*only).clone();
    }

    tracing::warn!("Response key {raw_key:?} does not match any file in the batch; storing as-is");
    key
}

fn record_fallback(doc: &mut AggregateDocument, batch_paths: &[String], raw: &str) {
    for path in batch_paths {
        doc.file_analyses.insert(
            path.clone(),
            json!({ "error": PARSE_FAILURE_MESSAGE, "raw_response": raw }),
        );
    }
}

fn update_progress(doc: &mut AggregateDocument, batch_index: usize, total_batches: usize) {
    doc.metadata.completed_batches = Some(batch_index);
    doc.metadata.total_batches = Some(total_batches);
    doc.metadata.files_analyzed = Some(doc.file_analyses.len());
}

/// Merge one batch response into `doc`. Never fails.
///
/// `batch_index` is 1-based. Progress counters are updated whatever the
/// response looked like.
pub fn merge_batch(
    doc: &mut AggregateDocument,
    raw: &str,
    batch_paths: &[String],
    batch_index: usize,
    total_batches: usize,
) -> MergeOutcome {
    let outcome = match parse_with_repair(raw) {
        Err(err) => {
            tracing::error!("Error parsing JSON response: {err}");
            record_fallback(doc, batch_paths, raw);
            MergeOutcome::Fallback { reason: format!("invalid JSON: {err}") }
        }
        Ok(parsed) => match parsed {
            Value::Object(mut top) => match top.remove("files") {
                Some(Value::Object(files)) => {
                    let (mut stored, mut dropped, mut malformed) = (0, 0, 0);
                    let mut covered = BTreeSet::new();
                    for (key, analysis) in files {
                        let path = canonical_key(&key, batch_paths);
                        covered.insert(path.clone());
                        match prune_empty(analysis) {
                            Some(cleaned @ Value::Object(_)) => {
                                doc.file_analyses.insert(path, cleaned);
                                stored += 1;
                            }
                            Some(_) => {
                                tracing::warn!("Analysis for {path} is not an object; storing an error entry");
                                doc.file_analyses.insert(
                                    path,
                                    json!({ "error": PARSE_FAILURE_MESSAGE, "raw_response": raw }),
                                );
                                malformed += 1;
                            }
                            None => dropped += 1,
                        }
                    }

                    let mut missing = 0;
                    for path in batch_paths.iter().filter(|p| !covered.contains(*p)) {
                        tracing::warn!("Response has no entry for {path}");
                        doc.file_analyses.insert(path.clone(), json!({ "error": MISSING_MESSAGE }));
                        missing += 1;
                    }
                    MergeOutcome::Parsed { stored, dropped, malformed, missing }
                }
                Some(_) => {
                    tracing::error!("Unexpected JSON structure: 'files' is not an object");
                    record_fallback(doc, batch_paths, raw);
                    MergeOutcome::Fallback { reason: "'files' is not an object".to_string() }
                }
                None => {
                    tracing::error!("Unexpected JSON structure: 'files' key not found");
                    record_fallback(doc, batch_paths, raw);
                    MergeOutcome::Fallback { reason: "'files' key not found".to_string() }
                }
            },
            _ => {
                tracing::error!("Unexpected JSON structure: top level is not an object");
                record_fallback(doc, batch_paths, raw);
                MergeOutcome::Fallback { reason: "top level is not an object".to_string() }
            }
        },
    };

    update_progress(doc, batch_index, total_batches);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::document::fixtures::sample_metadata;
    use serde_json::json;

    fn empty_doc() -> AggregateDocument {
        AggregateDocument::new(sample_metadata(), "repo/".to_string())
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_well_formed_response_round_trips() {
        let mut doc = empty_doc();
        let raw = r#"{"files": {"a.py": {"file_purpose": "x"}}}"#;
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py"]), 1, 1);

        assert_eq!(outcome, MergeOutcome::Parsed { stored: 1, dropped: 0, malformed: 0, missing: 0 });
        assert_eq!(serde_json::to_value(&doc.file_analyses).unwrap(), json!({"a.py": {"file_purpose": "x"}}));
        assert_eq!(doc.metadata.files_analyzed, Some(1));
        assert_eq!(doc.metadata.completed_batches, Some(1));
        assert_eq!(doc.metadata.total_batches, Some(1));
    }

    #[test]
    fn test_pruning_removes_empty_fields() {
        let mut doc = empty_doc();
        let raw = r#"{"files": {"a.py": {"file_purpose": "x", "dependencies": [], "classes": null}}}"#;
        merge_batch(&mut doc, raw, &paths(&["a.py"]), 1, 1);
        assert_eq!(doc.file_analyses["a.py"], json!({"file_purpose": "x"}));
    }

    #[test]
    fn test_prune_empty_is_recursive() {
        let value = json!({
            "classes": [{"name": "", "methods": []}, {"name": "Repo", "methods": ["", "load"]}],
            "api_endpoints": [{}],
            "file_type": "service"
        });
        assert_eq!(
            prune_empty(value),
            Some(json!({"classes": [{"name": "Repo", "methods": ["load"]}], "file_type": "service"}))
        );
        assert_eq!(prune_empty(json!({"a": {"b": [null, ""]}})), None);
        assert_eq!(prune_empty(json!(false)), Some(json!(false)));
        assert_eq!(prune_empty(json!(0)), Some(json!(0)));
    }

    #[test]
    fn test_entries_pruned_to_nothing_are_dropped() {
        let mut doc = empty_doc();
        let raw = r#"{"files": {"a.py": {"dependencies": []}, "b.py": {"file_type": "util"}}}"#;
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py", "b.py"]), 1, 1);
        assert_eq!(outcome, MergeOutcome::Parsed { stored: 1, dropped: 1, malformed: 0, missing: 0 });
        assert!(!doc.file_analyses.contains_key("a.py"));
        assert_eq!(doc.metadata.files_analyzed, Some(1));
    }

    #[test]
    fn test_non_json_gives_every_file_an_error_entry() {
        let mut doc = empty_doc();
        let batch = paths(&["a.py", "b/c.py", "d.rs"]);
        let raw = "Sorry, I cannot help with that.";
        let outcome = merge_batch(&mut doc, raw, &batch, 2, 3);

        assert!(matches!(outcome, MergeOutcome::Fallback { .. }));
        assert_eq!(doc.file_analyses.len(), 3);
        for path in &batch {
            let entry = &doc.file_analyses[path];
            assert_eq!(entry["error"], PARSE_FAILURE_MESSAGE);
            assert_eq!(entry["raw_response"], raw);
        }
        assert_eq!(doc.metadata.completed_batches, Some(2));
        assert_eq!(doc.metadata.total_batches, Some(3));
        assert_eq!(doc.metadata.files_analyzed, Some(3));
    }

    #[test]
    fn test_files_array_is_treated_as_failure() {
        let mut doc = empty_doc();
        let raw = r#"{"files": [{"path": "a.py", "file_purpose": "x"}]}"#;
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py"]), 1, 1);
        assert!(matches!(outcome, MergeOutcome::Fallback { .. }));
        assert!(doc.file_analyses["a.py"].get("error").is_some());
    }

    #[test]
    fn test_missing_files_key_is_treated_as_failure() {
        let mut doc = empty_doc();
        let outcome = merge_batch(&mut doc, r#"{"a.py": {}}"#, &paths(&["a.py"]), 1, 1);
        assert_eq!(outcome, MergeOutcome::Fallback { reason: "'files' key not found".to_string() });
    }

    #[test]
    fn test_repairable_response_is_merged() {
        let mut doc = empty_doc();
        let raw = "```json\n{\"files\": {\"a.py\": {\"file_purpose\": \"x\",},}}\n```";
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py"]), 1, 1);
        assert_eq!(outcome, MergeOutcome::Parsed { stored: 1, dropped: 0, malformed: 0, missing: 0 });
        assert_eq!(doc.file_analyses["a.py"], json!({"file_purpose": "x"}));
    }

    #[test]
    fn test_non_object_analyses_become_error_entries() {
        let mut doc = empty_doc();
        let raw = r#"{"files": {"a.py": "just a sentence", "b.py": [1], "c.py": {"file_type": "util"}}}"#;
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py", "b.py", "c.py"]), 1, 1);

        assert_eq!(outcome, MergeOutcome::Parsed { stored: 1, dropped: 0, malformed: 2, missing: 0 });
        for path in ["a.py", "b.py"] {
            assert_eq!(doc.file_analyses[path]["error"], PARSE_FAILURE_MESSAGE);
            assert_eq!(doc.file_analyses[path]["raw_response"], raw);
        }
        assert_eq!(doc.file_analyses["c.py"], json!({"file_type": "util"}));
        assert!(doc.file_analyses.values().all(Value::is_object));
    }

    #[test]
    fn test_files_left_out_of_response_get_error_entries() {
        let mut doc = empty_doc();
        let raw = r#"{"files": {"a.py": {"file_purpose": "x"}}}"#;
        let outcome = merge_batch(&mut doc, raw, &paths(&["a.py", "lib/b.py"]), 1, 1);

        assert_eq!(outcome, MergeOutcome::Parsed { stored: 1, dropped: 0, malformed: 0, missing: 1 });
        assert_eq!(doc.file_analyses["lib/b.py"], json!({"error": MISSING_MESSAGE}));
        assert_eq!(doc.metadata.files_analyzed, Some(2));
    }

    #[test]
    fn test_canonical_key_translation() {
        let batch = paths(&["src/app/models.py", "src/app/views.py", "README.md"]);
        assert_eq!(canonical_key("src/app/models.py", &batch), "src/app/models.py");
        assert_eq!(canonical_key("./README.md", &batch), "README.md");
        assert_eq!(canonical_key("app/views.py", &batch), "src/app/views.py");
        assert_eq!(canonical_key("models.py", &batch), "src/app/models.py");
        assert_eq!(canonical_key("src\\app\\views.py", &batch), "src/app/views.py");
        assert_eq!(canonical_key("other.py", &batch), "other.py");
    }

    #[test]
    fn test_ambiguous_file_name_is_kept_verbatim() {
        let batch = paths(&["a/mod.rs", "b/mod.rs"]);
        assert_eq!(canonical_key("mod.rs", &batch), "mod.rs");
    }

    #[test]
    fn test_merge_keeps_entries_from_earlier_batches() {
        let mut doc = empty_doc();
        merge_batch(&mut doc, r#"{"files": {"a.py": {"file_type": "x"}}}"#, &paths(&["a.py"]), 1, 2);
        merge_batch(&mut doc, "garbage", &paths(&["b.py"]), 2, 2);
        assert_eq!(doc.file_analyses.len(), 2);
        assert_eq!(doc.file_analyses["a.py"], json!({"file_type": "x"}));
        assert_eq!(doc.metadata.completed_batches, Some(2));
    }
}
