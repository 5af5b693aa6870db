//! Shared helpers: paths, encodings, file classification.

pub mod classify;
pub mod encoding;
pub mod paths;

pub use classify::{is_denied_dir, is_test_file};
pub use encoding::decode_bytes;
pub use paths::normalize_path;
