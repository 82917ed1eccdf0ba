//! Shared helpers: encoding-aware reads, text classification, path handling.

pub mod classify;
pub mod encoding;
pub mod paths;

pub use classify::is_text_file;
pub use encoding::read_file_safe;
pub use paths::{normalize_path, relative_path};

/// Format an integer with thousands separators (e.g. `12345` -> `12,345`).
pub fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
