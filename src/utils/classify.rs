//! File classification helpers for detecting test files and non-source directories.

use once_cell::sync::Lazy;
use regex::Regex;

use super::paths::file_name;

/// Filename patterns that mark a file as a test.
static TEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\.test\.[cm]?[jt]sx?$").unwrap(),
        Regex::new(r"\.spec\.[cm]?[jt]sx?$").unwrap(),
        Regex::new(r"_test\.[cm]?[jt]sx?$").unwrap(),
        Regex::new(r"Tests?\.java$").unwrap(),
        Regex::new(r"_test\.py$").unwrap(),
        Regex::new(r"^test_.*\.py$").unwrap(),
        Regex::new(r"_test\.go$").unwrap(),
        Regex::new(r"_spec\.rb$").unwrap(),
    ]
});

/// Check if a path names a test file.
///
/// Only the file name is inspected, so `test_utils/helpers.py` is not a test
/// but `pkg/test_helpers.py` is.
pub fn is_test_file(path: &str) -> bool {
    let name = file_name(path);
    TEST_PATTERNS.iter().any(|p| p.is_match(name))
}

/// Check if a directory should be skipped while indexing.
///
/// Hidden directories are always skipped; `deny` holds exact names.
pub fn is_denied_dir(name: &str, deny: &[String]) -> bool {
    name.starts_with('.') || deny.iter().any(|d| d == name)
}
