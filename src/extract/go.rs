//! Go import blocks and single-line imports; only `./` and `../` paths are tracked.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{RawSpecifier, RelationKind};

static IMPORT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\bimport\s*\((.*?)\)").unwrap());
static BLOCK_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*(?:[\w.]+\s+)?"([^"]+)""#).unwrap());
static IMPORT_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).unwrap());

pub fn extract(content: &str) -> Vec<RawSpecifier> {
    let mut paths = Vec::new();
    for block in IMPORT_BLOCK.captures_iter(content) {
        if let Some(body) = block.get(1) {
            paths.extend(BLOCK_ENTRY.captures_iter(body.as_str()).filter_map(|c| c.get(1)).map(|m| m.as_str()));
        }
    }
    paths.extend(IMPORT_SINGLE.captures_iter(content).filter_map(|c| c.get(1)).map(|m| m.as_str()));

    paths
        .into_iter()
        .filter(|p| p.starts_with("./") || p.starts_with("../"))
        .map(|p| RawSpecifier::new(p, RelationKind::Import))
        .collect()
}
