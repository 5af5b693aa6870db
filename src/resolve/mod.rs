//! Import specifier resolution against the repository index.
//!
//! Only intra-repository edges are tracked: a specifier that does not start
//! with `.` or `/` names an external package and never resolves.
//!
//! Resolution order, first match wins:
//! 1. the normalized path itself
//! 2. the normalized path plus a known extension
//! 3. an index file inside the normalized path (`index.ts`, `__init__.py`, ...)
//! 4. the specifier tail under up to three ancestor directories combined with
//!    conventional source directories (`src`, `lib`, `shared`, ...)
//! 5. the first indexed path, in lexicographic order, with the same
//!    extension-stripped file name (flagged [`Confidence::Similar`])
//!
//! The importing file is never its own target; a step that only finds
//! `from` moves on to the next candidate.

use crate::domain::{Confidence, RawSpecifier};
use crate::scan::RepositoryIndex;
use crate::utils::is_test_file;
use crate::utils::paths::{ancestors, extension, file_name, join, normalize_segments, parent_dir, split_extension};

pub const CANDIDATE_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".json", ".py", ".java", ".go", ".rb"];

const INDEX_FILES: &[&str] = &["index.js", "index.jsx", "index.ts", "index.tsx", "__init__.py"];

const STYLE_EXTENSIONS: &[&str] = &[".scss", ".sass", ".less", ".css"];

const CONVENTIONAL_DIRS: &[&str] =
    &["", "src", "lib", "utils", "components", "services", "helpers", "core", "common", "shared"];

const ANCESTOR_LEVELS: usize = 3;

/// A resolved target and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: String,
    pub confidence: Confidence,
}

impl Resolution {
    fn new(path: String, confidence: Confidence) -> Self {
        Self { path, confidence }
    }
}

/// Resolves specifiers found in one file to indexed repository paths.
///
/// Pure over the index: the same index and inputs always give the same result.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    index: &'a RepositoryIndex,
}

pub fn is_external(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/'))
}

impl<'a> PathResolver<'a> {
    pub fn new(index: &'a RepositoryIndex) -> Self {
        Self { index }
    }

    /// Resolve an extracted specifier, honoring its `exact` flag.
    pub fn resolve_raw(&self, from: &str, raw: &RawSpecifier) -> Option<Resolution> {
        if raw.exact {
            self.resolve_exact(from, &raw.specifier)
        } else {
            self.resolve(from, &raw.specifier)
        }
    }

    /// Only step 1: the normalized path must itself be indexed.
    pub fn resolve_exact(&self, from: &str, specifier: &str) -> Option<Resolution> {
        let target = self.target(from, specifier.trim())?;
        self.hit(&target, from)
            .then(|| Resolution::new(target, Confidence::Exact))
    }

    /// Resolve `specifier` as written in `from`. `None` when unresolvable
    /// or external.
    pub fn resolve(&self, from: &str, specifier: &str) -> Option<Resolution> {
        let specifier = specifier.trim();
        let target = self.target(from, specifier)?;

        let resolution = self
            .with_extensions(&target, from)
            .or_else(|| self.search_ancestors(from, specifier, &target))
            .or_else(|| self.similar(&target, from))?;

        tracing::debug!(
            "{}: '{}' -> {} ({:?})",
            from,
            specifier,
            resolution.path,
            resolution.confidence
        );
        Some(resolution)
    }

    fn target(&self, from: &str, specifier: &str) -> Option<String> {
        if specifier.is_empty() || is_external(specifier) {
            return None;
        }
        Some(if specifier.starts_with('/') {
            normalize_segments(specifier)
        } else {
            normalize_segments(&join(&[parent_dir(from), specifier]))
        })
    }

    /// An indexed path other than the importing file.
    fn hit(&self, candidate: &str, from: &str) -> bool {
        candidate != from && self.index.contains(candidate)
    }

    /// Steps 1 to 3 for one candidate base path.
    fn with_extensions(&self, base: &str, from: &str) -> Option<Resolution> {
        // an empty base is the root itself: only index files apply
        if !base.is_empty() && self.hit(base, from) {
            return Some(Resolution::new(base.to_string(), Confidence::Exact));
        }
        if !base.is_empty() {
            for ext in CANDIDATE_EXTENSIONS {
                let candidate = format!("{base}{ext}");
                if self.hit(&candidate, from) {
                    return Some(Resolution::new(candidate, Confidence::Probed));
                }
            }
        }
        for name in INDEX_FILES {
            let candidate = join(&[base, name]);
            if self.hit(&candidate, from) {
                return Some(Resolution::new(candidate, Confidence::Probed));
            }
        }
        match extension(from).as_str() {
            ".go" => self.go_package(base, from),
            ".css" | ".scss" | ".sass" | ".less" => self.stylesheet(base, from),
            _ => None,
        }
    }

    /// Stylesheet imports omit the extension and the partial underscore.
    fn stylesheet(&self, base: &str, from: &str) -> Option<Resolution> {
        if base.is_empty() {
            return None;
        }
        let partial = join(&[parent_dir(base), &format!("_{}", file_name(base))]);
        STYLE_EXTENSIONS
            .iter()
            .flat_map(|ext| [format!("{base}{ext}"), format!("{partial}{ext}")])
            .find(|candidate| self.hit(candidate, from))
            .map(|candidate| Resolution::new(candidate, Confidence::Probed))
    }

    /// Go imports name a package directory; pick its first non-test source.
    fn go_package(&self, dir: &str, from: &str) -> Option<Resolution> {
        self.index
            .iter()
            .filter(|p| parent_dir(p) == dir && p.as_str() != from)
            .find(|p| p.ends_with(".go") && !is_test_file(p))
            .map(|p| Resolution::new(p.clone(), Confidence::Probed))
    }

    fn search_ancestors(&self, from: &str, specifier: &str, normalized: &str) -> Option<Resolution> {
        let tail = specifier_tail(specifier);
        let base_name = file_name(tail);
        let mut names = vec![tail];
        if base_name != tail {
            names.push(base_name);
        }
        if tail.is_empty() {
            return None;
        }

        let levels = ancestors(parent_dir(from), ANCESTOR_LEVELS);
        for name in names {
            for ancestor in &levels {
                for dir in CONVENTIONAL_DIRS {
                    let candidate = join(&[ancestor, dir, name]);
                    if candidate == normalized {
                        continue;
                    }
                    if let Some(found) = self.with_extensions(&candidate, from) {
                        return Some(Resolution::new(found.path, Confidence::Ancestor));
                    }
                }
            }
        }
        None
    }

    fn similar(&self, target: &str, from: &str) -> Option<Resolution> {
        let (stem, _) = split_extension(file_name(target));
        if stem.is_empty() {
            return None;
        }
        let found = self.index.paths_with_stem(stem).find(|p| p.as_str() != from)?;
        tracing::debug!("{}: low-confidence match {} for {}", from, found, target);
        Some(Resolution::new(found.clone(), Confidence::Similar))
    }
}

/// The specifier without leading `./`, `../` and `/` segments.
fn specifier_tail(specifier: &str) -> &str {
    let mut rest = specifier;
    loop {
        if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else {
            break;
        }
    }
    match rest {
        "." | ".." => "",
        _ => rest.trim_end_matches('/'),
    }
}
