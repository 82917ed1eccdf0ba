//! Text/binary classification for discovered files.

use crate::domain::DEFAULT_TEXT_EXTENSIONS;
use crate::utils::encoding::sample_is_utf8;
use std::path::Path;

/// Extensions whose conventional content type is `text/*`, beyond the fast-path list.
const TEXT_MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("htm", "text/html"),
    ("xhtml", "text/html"),
    ("markdown", "text/markdown"),
    ("rst", "text/x-rst"),
    ("tex", "text/x-tex"),
    ("ics", "text/calendar"),
    ("vtt", "text/vtt"),
    ("mjs", "text/javascript"),
    ("cjs", "text/javascript"),
    ("kt", "text/x-kotlin"),
    ("cs", "text/x-csharp"),
    ("pl", "text/x-perl"),
    ("lua", "text/x-lua"),
    ("r", "text/x-r"),
    ("svg", "text/xml"),
    ("log", "text/plain"),
    ("conf", "text/plain"),
    ("env", "text/plain"),
    ("lock", "text/plain"),
];

const TEXT_FILE_NAMES: &[&str] = &[
    "makefile",
    "dockerfile",
    "rakefile",
    "gemfile",
    "procfile",
    "vagrantfile",
    "jenkinsfile",
    "license",
    "readme",
];

/// Best-effort content-type guess from the file name. Only text types are known.
pub fn guess_text_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    if ext.is_empty() {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase();
        return TEXT_FILE_NAMES.contains(&name.as_str()).then_some("text/plain");
    }
    TEXT_MIME_EXTENSIONS.iter().find(|(known, _)| *known == ext).map(|(_, mime)| *mime)
}

fn has_text_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext_with_dot = format!(".{}", ext.to_lowercase());
    DEFAULT_TEXT_EXTENSIONS.contains(&ext_with_dot.as_str())
}

/// Decide whether a file is text.
///
/// Extension allow-list, then content-type guess, then a UTF-8 decode check of
/// the first 1 KiB. Missing or unreadable files are reported as non-text.
pub fn is_text_file(path: &Path) -> bool {
    if !path.exists() {
        tracing::warn!("File not found when checking if text file: {}", path.display());
        return false;
    }

    if has_text_extension(path) {
        return true;
    }

    if guess_text_mime(path).is_some_and(|mime| mime.starts_with("text/")) {
        return true;
    }

    match sample_is_utf8(path) {
        Ok(is_text) => is_text,
        Err(err) => {
            tracing::warn!("Error checking if {} is text: {}", path.display(), err);
            false
        }
    }
}
