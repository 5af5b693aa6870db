//! Dependency extraction: raw module specifiers from one file's source text.
//!
//! The extractor is chosen from the file extension. JavaScript and TypeScript
//! run both the syntax-tree extractor and the script patterns; the union
//! catches forms the tree walk does not look for (triple-slash references,
//! module mocks). Everything else has a regex extractor, with a generic
//! include/require/import pattern as the default.

use std::collections::HashSet;

use crate::domain::RawSpecifier;
use crate::utils::paths::extension;

pub mod go;
pub mod java;
pub mod patterns;
pub mod python;
pub mod structured;

use structured::Grammar;

/// Strategy chosen per file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Scripts with a tree-sitter grammar, or `None` for embedded scripts
    /// (`.vue`, `.svelte`) handled by patterns alone.
    Script(Option<Grammar>),
    Python,
    Java,
    Go,
    Ruby,
    CFamily,
    Stylesheet,
    Generic,
}

impl Extractor {
    pub fn for_path(path: &str) -> Self {
        let ext = extension(path);
        if let Some(grammar) = Grammar::for_extension(&ext) {
            return Extractor::Script(Some(grammar));
        }
        match ext.as_str() {
            ".vue" | ".svelte" | ".astro" => Extractor::Script(None),
            ".py" | ".pyi" => Extractor::Python,
            ".java" => Extractor::Java,
            ".go" => Extractor::Go,
            ".rb" => Extractor::Ruby,
            ".c" | ".h" | ".cc" | ".cpp" | ".cxx" | ".hpp" | ".hh" | ".m" | ".mm" => Extractor::CFamily,
            ".css" | ".scss" | ".sass" | ".less" => Extractor::Stylesheet,
            _ => Extractor::Generic,
        }
    }

    /// Raw specifiers in discovery order, duplicates removed.
    pub fn extract(&self, path: &str, content: &str) -> Vec<RawSpecifier> {
        let found = match self {
            Extractor::Script(grammar) => {
                let mut found = Vec::new();
                if let Some(grammar) = grammar {
                    match structured::extract(path, content, *grammar) {
                        Ok(specs) => found = specs,
                        Err(e) => tracing::warn!("Falling back to patterns for {}: {}", path, e),
                    }
                }
                found.extend(patterns::script(content));
                found
            }
            Extractor::Python => python::extract(content),
            Extractor::Java => java::extract(path, content),
            Extractor::Go => go::extract(content),
            Extractor::Ruby => patterns::ruby(content),
            Extractor::CFamily => patterns::c_family(content),
            Extractor::Stylesheet => patterns::stylesheet(content),
            Extractor::Generic => patterns::generic(content),
        };
        dedup(found)
    }
}

/// Extract raw specifiers from `content` using the strategy for `path`.
pub fn extract_specifiers(path: &str, content: &str) -> Vec<RawSpecifier> {
    Extractor::for_path(path).extract(path, content)
}

/// Keep the first occurrence of each specifier string.
fn dedup(specs: Vec<RawSpecifier>) -> Vec<RawSpecifier> {
    let mut seen = HashSet::new();
    specs.into_iter().filter(|s| seen.insert(s.specifier.clone())).collect()
}
