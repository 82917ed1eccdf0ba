//! Heuristic repair for almost-JSON model output.
//!
//! Each rule is a standalone text-to-text pass. [`repair`] applies all of them
//! in a fixed order; the parser itself stays strict.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?\s*```\s*\z").expect("valid regex")
});

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z0-9_]+)(\s*:)").expect("valid regex"));

/// Remove a Markdown code fence wrapping the whole text.
pub fn strip_code_fence(text: &str) -> String {
    match CODE_FENCE.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}

/// Drop commas that directly precede `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Quote identifier-like object keys that are missing quotes.
pub fn quote_bare_keys(text: &str) -> String {
    BARE_KEY.replace_all(text, "$1\"$2\"$3").into_owned()
}

/// All rules, in order.
pub fn repair(text: &str) -> String {
    let text = strip_code_fence(text);
    let text = strip_trailing_commas(&text);
    quote_bare_keys(&text)
}

/// Strict parse first; only when that fails, parse the repaired text.
///
/// Rules can damage string values that look like keys, so valid input is never
/// rewritten. On double failure the strict parser's error is returned.
pub fn parse_with_repair(text: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            let repaired = repair(text);
            serde_json::from_str(&repaired).map_err(|_| strict_err)
        }
    }
}
