//! Encoding detection and file reading with UTF-8 fallback logic.
//!
//! Source files are sent to the summarizer as text, so every read goes through
//! [`read_file_safe`], which handles:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Replacement characters instead of hard failures

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Size of the prefix inspected by [`sample_is_utf8`].
pub const UTF8_SAMPLE_SIZE: usize = 1024;

/// Detect the encoding of a file.
///
/// 1. BOM markers
/// 2. Strict UTF-8 on a sample
/// 3. chardetng guess
///
/// Returns `"utf-8"` when the file cannot be read.
pub fn detect_encoding(path: &Path, sample_size: usize) -> String {
    detect_encoding_impl(path, sample_size).unwrap_or_else(|_| "utf-8".to_string())
}

fn detect_encoding_impl(path: &Path, sample_size: usize) -> Result<String> {
    let sample = read_sample(path, sample_size)?;

    if sample.is_empty() {
        return Ok("utf-8".to_string());
    }

    if sample.starts_with(&[0xef, 0xbb, 0xbf]) {
        return Ok("utf-8-sig".to_string());
    }
    if sample.starts_with(&[0xff, 0xfe]) {
        return Ok("utf-16-le".to_string());
    }
    if sample.starts_with(&[0xfe, 0xff]) {
        return Ok("utf-16-be".to_string());
    }

    if is_utf8_prefix(&sample) {
        return Ok("utf-8".to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true);

    let name = encoding.name().to_lowercase();
    if name.contains("utf-8") || name == "ascii" {
        Ok("utf-8".to_string())
    } else {
        Ok(name)
    }
}

/// Does the first [`UTF8_SAMPLE_SIZE`] bytes of the file decode as UTF-8?
///
/// A multi-byte sequence cut off by the sample boundary does not count as a
/// decode failure. I/O errors are returned to the caller.
pub fn sample_is_utf8(path: &Path) -> Result<bool> {
    let sample = read_sample(path, UTF8_SAMPLE_SIZE)?;
    Ok(is_utf8_prefix(&sample))
}

/// `true` when `bytes` is valid UTF-8, allowing an incomplete trailing sequence.
fn is_utf8_prefix(bytes: &[u8]) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        // error_len() == None means the input ended mid-character
        Err(err) => err.error_len().is_none(),
    }
}

fn read_sample(path: &Path, sample_size: usize) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(sample_size);
    file.take(sample_size as u64).read_to_end(&mut sample)?;
    Ok(sample)
}

/// Read a file safely with encoding detection and error handling.
///
/// 1. Strict UTF-8
/// 2. Detected encoding with replacement
/// 3. UTF-8 with replacement characters
///
/// Returns `(content, encoding_used)`.
pub fn read_file_safe(path: &Path) -> Result<(String, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    if let Ok(content) = std::str::from_utf8(&bytes) {
        return Ok((content.to_string(), "utf-8".to_string()));
    }

    let detected = detect_encoding(path, DEFAULT_SAMPLE_SIZE);
    if let Some(encoding) = Encoding::for_label(detected.as_bytes()) {
        let (decoded, _, _) = encoding.decode(&bytes);
        return Ok((decoded.into_owned(), encoding.name().to_lowercase()));
    }

    let (cow, _, _) = UTF_8.decode(&bytes);
    Ok((cow.into_owned(), "utf-8".to_string()))
}
