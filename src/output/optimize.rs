//! Optional compression pass over a finished document.
//!
//! The proposal from the summarizer is only kept when it is valid, keeps the
//! document shape, and is strictly smaller. In every other case the original
//! is written to the output path so the caller always gets a usable file.

use crate::llm::prompt::{optimize_prompt, OPTIMIZE_SYSTEM};
use crate::llm::{CompletionRequest, Summarizer};
use crate::output::document::REQUIRED_TOP_LEVEL_KEYS;
use crate::output::repair::parse_with_repair;
use crate::output::store::write_atomic;
use anyhow::{Context, Result};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Accepted { original_size: usize, optimized_size: usize },
    Rejected { reason: String },
}

impl OptimizeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// `<output>.error.json`, where unparseable proposals are kept for inspection.
pub fn error_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".error.json");
    PathBuf::from(name)
}

/// Why `candidate` cannot replace a document of `original_size` compact bytes.
fn rejection_reason(candidate: &Value, candidate_size: usize, original_size: usize) -> Option<String> {
    let Some(top) = candidate.as_object() else {
        return Some("proposal is not a JSON object".to_string());
    };
    if let Some(missing) = REQUIRED_TOP_LEVEL_KEYS.iter().find(|key| !top.contains_key(**key)) {
        return Some(format!("proposal is missing the '{missing}' key"));
    }
    if !top["file_analyses"].is_object() {
        return Some("proposal's 'file_analyses' is not an object".to_string());
    }
    if candidate_size >= original_size {
        return Some(format!(
            "proposal is not smaller ({candidate_size} >= {original_size} bytes)"
        ));
    }
    None
}

/// Ask `summarizer` for a compressed copy of `original` and write the result
/// to `output`.
///
/// Only writing the output can fail; every problem with the proposal becomes
/// [`OptimizeOutcome::Rejected`].
pub fn optimize_document(
    summarizer: &dyn Summarizer,
    original: &Value,
    output: &Path,
) -> Result<OptimizeOutcome> {
    let compact = serde_json::to_string(original).context("failed to serialize document")?;
    let original_size = compact.len();
    tracing::info!("Optimizing {original_size} bytes of JSON with model {}", summarizer.model());

    let prompt = optimize_prompt(&compact);
    let request = CompletionRequest { system: OPTIMIZE_SYSTEM, prompt: &prompt, temperature: Some(0.0) };

    let outcome = match summarizer.complete(&request) {
        Err(err) => {
            tracing::error!("Optimization request failed: {err}");
            OptimizeOutcome::Rejected { reason: format!("request failed: {err}") }
        }
        Ok(text) => match parse_with_repair(&text) {
            Err(err) => {
                tracing::error!("Error parsing optimized JSON: {err}");
                let dump = error_path(output);
                match fs::write(&dump, &text) {
                    Ok(()) => tracing::info!("Saved unparseable proposal to {}", dump.display()),
                    Err(write_err) => {
                        tracing::warn!("Could not save proposal to {}: {write_err}", dump.display())
                    }
                }
                OptimizeOutcome::Rejected { reason: format!("proposal is not valid JSON: {err}") }
            }
            Ok(candidate) => {
                let candidate_compact =
                    serde_json::to_string(&candidate).context("failed to serialize proposal")?;
                let optimized_size = candidate_compact.len();
                match rejection_reason(&candidate, optimized_size, original_size) {
                    Some(reason) => OptimizeOutcome::Rejected { reason },
                    None => {
                        let pretty = serde_json::to_string_pretty(&candidate)
                            .context("failed to serialize proposal")?;
                        write_atomic(output, &pretty)?;
                        let reduction =
                            (original_size - optimized_size) as f64 / original_size as f64 * 100.0;
                        tracing::info!(
                            "JSON optimization complete. Size reduction: {reduction:.2}% \
                             ({original_size} -> {optimized_size} bytes)"
                        );
                        return Ok(OptimizeOutcome::Accepted { original_size, optimized_size });
                    }
                }
            }
        },
    };

    if let OptimizeOutcome::Rejected { reason } = &outcome {
        tracing::warn!("Optimization rejected ({reason}); writing original document");
    }
    let pretty = serde_json::to_string_pretty(original).context("failed to serialize document")?;
    write_atomic(output, &pretty)?;
    Ok(outcome)
}

/// Read a document from `input` and optimize it into `output`.
pub fn optimize_file(summarizer: &dyn Summarizer, input: &Path, output: &Path) -> Result<OptimizeOutcome> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let original: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;
    optimize_document(summarizer, &original, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SummarizeError;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Canned {
        reply: Result<String, u16>,
        temperature: Cell<Option<f32>>,
    }

    impl Canned {
        fn ok(text: &str) -> Self {
            Self { reply: Ok(text.to_string()), temperature: Cell::new(None) }
        }
    }

    impl Summarizer for Canned {
        fn model(&self) -> &str {
            "canned"
        }
        fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SummarizeError> {
            self.temperature.set(request.temperature);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(SummarizeError::Api { status: *status, body: "nope".to_string() }),
            }
        }
    }

    fn original() -> Value {
        json!({
            "metadata": {"total_files": 1, "completion_status": "completed"},
            "file_tree": "repo/\n└── a.py",
            "file_analyses": {
                "a.py": {"file_purpose": "Loads the configuration file and validates every section of it"}
            }
        })
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_smaller_valid_proposal_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let proposal = json!({
            "metadata": {"total_files": 1, "completion_status": "completed"},
            "file_tree": "repo/\n└── a.py",
            "file_analyses": {"a.py": {"file_purpose": "Loads config"}}
        });
        let summarizer = Canned::ok(&proposal.to_string());

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(read(&out), proposal);
        assert_eq!(summarizer.temperature.get(), Some(0.0));
    }

    #[test]
    fn test_larger_proposal_writes_original() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let mut bigger = original();
        bigger["file_analyses"]["a.py"]["notes"] = json!("an extra field that only adds bytes to the document");
        let summarizer = Canned::ok(&bigger.to_string());

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert!(matches!(outcome, OptimizeOutcome::Rejected { .. }));
        assert_eq!(read(&out), original());
    }

    #[test]
    fn test_proposal_missing_keys_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let summarizer = Canned::ok(r#"{"file_analyses": {}}"#);

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert_eq!(outcome, OptimizeOutcome::Rejected { reason: "proposal is missing the 'metadata' key".to_string() });
        assert_eq!(read(&out), original());
    }

    #[test]
    fn test_proposal_with_array_analyses_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let summarizer = Canned::ok(r#"{"metadata": {}, "file_tree": "", "file_analyses": []}"#);

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert!(!outcome.is_accepted());
        assert_eq!(read(&out), original());
    }

    #[test]
    fn test_unparseable_proposal_is_saved_beside_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let summarizer = Canned::ok("I shortened it for you!");

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert!(!outcome.is_accepted());
        assert_eq!(read(&out), original());
        assert_eq!(fs::read_to_string(tmp.path().join("opt.json.error.json")).unwrap(), "I shortened it for you!");
    }

    #[test]
    fn test_request_failure_writes_original() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("opt.json");
        let summarizer = Canned { reply: Err(500), temperature: Cell::new(None) };

        let outcome = optimize_document(&summarizer, &original(), &out).unwrap();
        assert!(!outcome.is_accepted());
        assert_eq!(read(&out), original());
    }

    #[test]
    fn test_optimize_file_rejects_invalid_input() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.json");
        fs::write(&input, "nope").unwrap();
        let summarizer = Canned::ok("{}");
        assert!(optimize_file(&summarizer, &input, &tmp.path().join("out.json")).is_err());
    }

    #[test]
    fn test_error_path_appends_suffix() {
        assert_eq!(error_path(Path::new("dir/out.json")), PathBuf::from("dir/out.json.error.json"));
    }
}
