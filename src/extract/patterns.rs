//! Regex extraction for scripts, Ruby, C-family, stylesheets and anything else.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{RawSpecifier, RelationKind};

static SCRIPT_PATTERNS: Lazy<Vec<(Regex, RelationKind)>> = Lazy::new(|| {
    vec![
        // import x from '...', import { a, b } from '...', export * from '...'
        (Regex::new(r#"\b(?:import|export)\b[^;'"`]*?\bfrom\s*['"]([^'"]+)['"]"#).unwrap(), RelationKind::Import),
        // side-effect import
        (Regex::new(r#"\bimport\s*['"]([^'"]+)['"]"#).unwrap(), RelationKind::Import),
        (Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap(), RelationKind::Require),
        (Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap(), RelationKind::Import),
        (Regex::new(r#"///\s*<reference\s+path\s*=\s*['"]([^'"]+)['"]"#).unwrap(), RelationKind::Reference),
        (Regex::new(r#"\b(?:jest|vi)\.mock\s*\(\s*['"]([^'"]+)['"]"#).unwrap(), RelationKind::Reference),
    ]
});

static RUBY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"\brequire_relative\s*\(?\s*['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"\brequire\s*\(?\s*['"](\.{1,2}/[^'"]+)['"]"#).unwrap(),
    ]
});

static C_INCLUDE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*#\s*include\s+"([^"]+)""#).unwrap());

static STYLE_PATTERNS: Lazy<Vec<(Regex, RelationKind)>> = Lazy::new(|| {
    vec![
        (Regex::new(r#"@import\s+(?:url\(\s*)?['"]([^'"]+)['"]"#).unwrap(), RelationKind::Reference),
        (Regex::new(r#"@(?:use|forward)\s+['"]([^'"]+)['"]"#).unwrap(), RelationKind::Uses),
    ]
});

static GENERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:include|require|import|from)\s+['"]([./][^'"]+)['"]"#).unwrap());

fn push_captures(re: &Regex, content: &str, kind: RelationKind, out: &mut Vec<RawSpecifier>) {
    for cap in re.captures_iter(content) {
        if let Some(m) = cap.get(1) {
            out.push(RawSpecifier::new(m.as_str(), kind));
        }
    }
}

/// Make a same-directory reference explicit so the resolver treats it as relative.
fn relative(spec: &str) -> String {
    if spec.starts_with('.') || spec.starts_with('/') {
        spec.to_string()
    } else {
        format!("./{spec}")
    }
}

/// Import, re-export, `require`, dynamic `import`, triple-slash references
/// and test-runner module mocks.
///
/// Results are grouped by pattern, not in source order.
pub fn script(content: &str) -> Vec<RawSpecifier> {
    let mut out = Vec::new();
    for (re, kind) in SCRIPT_PATTERNS.iter() {
        push_captures(re, content, *kind, &mut out);
    }
    out
}

/// `require_relative` and dot-relative `require`.
pub fn ruby(content: &str) -> Vec<RawSpecifier> {
    let mut out = Vec::new();
    for re in RUBY_PATTERNS.iter() {
        for cap in re.captures_iter(content) {
            if let Some(m) = cap.get(1) {
                out.push(RawSpecifier::new(relative(m.as_str()), RelationKind::Require));
            }
        }
    }
    out
}

/// Quoted `#include` directives; angle-bracket includes are system headers.
pub fn c_family(content: &str) -> Vec<RawSpecifier> {
    C_INCLUDE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| RawSpecifier::new(relative(m.as_str()), RelationKind::Reference))
        .collect()
}

/// `@import` as references, Sass `@use`/`@forward` as uses.
///
/// Remote URLs and built-in Sass modules (`sass:math`) are skipped.
pub fn stylesheet(content: &str) -> Vec<RawSpecifier> {
    let mut out = Vec::new();
    for (re, kind) in STYLE_PATTERNS.iter() {
        for cap in re.captures_iter(content) {
            let Some(m) = cap.get(1) else { continue };
            let spec = m.as_str();
            if spec.contains(':') || spec.starts_with("//") || spec.starts_with('~') {
                continue;
            }
            out.push(RawSpecifier::new(relative(spec), *kind));
        }
    }
    out
}

pub fn generic(content: &str) -> Vec<RawSpecifier> {
    let mut out = Vec::new();
    push_captures(&GENERIC, content, RelationKind::Reference, &mut out);
    out
}
