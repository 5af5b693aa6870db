//! Output rendering (JSON, plain text)

pub mod json;
pub mod text;

pub use json::{render_json, write_report};
pub use text::render_text;
