//! Decoding of fetched file bytes with encoding detection.
//!
//! File contents arrive as raw bytes (base64-decoded API payloads or local
//! reads). This module turns them into text:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast-path with strict validation
//! - Fallback encoding detection using chardetng
//! - Binary detection, which makes the content absent

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Detect the encoding of a byte buffer.
///
/// Strategy:
/// 1. Check for BOM markers first (most reliable)
/// 2. Try strict UTF-8 decoding of the sample
/// 3. Fall back to chardetng for non-UTF-8 input
///
/// # Returns
/// The detected [`Encoding`] and whether a BOM was present
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, bool) {
    if bytes.starts_with(&[0xef, 0xbb, 0xbf]) {
        return (UTF_8, true);
    }
    if bytes.starts_with(&[0xff, 0xfe]) {
        return (UTF_16LE, true);
    }
    if bytes.starts_with(&[0xfe, 0xff]) {
        return (UTF_16BE, true);
    }

    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    if utf8_prefix_is_valid(sample) {
        return (UTF_8, false);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    (detector.guess(None, true), false)
}

/// A sample cut at an arbitrary byte may end mid-character; only the
/// trailing incomplete sequence is tolerated.
fn utf8_prefix_is_valid(sample: &[u8]) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

/// Detect if a byte buffer is binary (not text).
///
/// Uses two heuristics:
/// 1. Null byte check (strong binary indicator)
/// 2. Ratio of printable ASCII bytes (< 70% = likely binary)
///
/// UTF-16 input is recognised by its BOM before either heuristic runs.
pub fn is_binary(bytes: &[u8]) -> bool {
    if bytes.starts_with(&[0xff, 0xfe]) || bytes.starts_with(&[0xfe, 0xff]) {
        return false;
    }

    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }

    if sample.contains(&0) {
        return true;
    }

    // Multi-byte UTF-8 text is text even when it is mostly non-ASCII.
    if utf8_prefix_is_valid(sample) {
        return false;
    }

    let printable_count = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == 9 || b == 10 || b == 13)
        .count();

    (printable_count as f64 / sample.len() as f64) < 0.70
}

/// Decode file bytes into text, or `None` for binary content.
pub fn decode_bytes(bytes: &[u8]) -> Option<String> {
    if is_binary(bytes) {
        return None;
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_string());
    }

    let (encoding, _) = detect_encoding(bytes);
    // `decode` sniffs and strips BOMs itself
    let (decoded, _used, _had_errors) = encoding.decode(bytes);
    Some(decoded.into_owned())
}
