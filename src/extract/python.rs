//! Python relative imports.
//!
//! Absolute imports (`import os`, `from pkg import x`) name installed or
//! top-level packages and are not tracked. Each leading dot after the first
//! climbs one directory.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{RawSpecifier, RelationKind};

static FROM_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*from[ \t]+(\.+)([\w.]*)[ \t]+import[ \t]+(\([^)]*\)|[^\n#;]+)").unwrap()
});

pub fn extract(content: &str) -> Vec<RawSpecifier> {
    let mut out = Vec::new();
    for cap in FROM_RELATIVE.captures_iter(content) {
        let dots = cap.get(1).map_or(0, |m| m.as_str().len());
        let module = cap.get(2).map_or("", |m| m.as_str());
        let prefix = hop_prefix(dots);

        if module.is_empty() {
            // `from . import a, b` imports sibling modules
            let names = cap.get(3).map_or("", |m| m.as_str());
            for name in imported_names(names) {
                out.push(RawSpecifier::new(format!("{prefix}{name}"), RelationKind::Import));
            }
        } else {
            out.push(RawSpecifier::new(format!("{prefix}{}", module.replace('.', "/")), RelationKind::Import));
        }
    }
    out
}

fn hop_prefix(dots: usize) -> String {
    if dots <= 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    }
}

fn imported_names(list: &str) -> Vec<&str> {
    list.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .filter_map(|item| item.split_whitespace().next())
        .filter(|name| *name != "*" && name.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(content: &str) -> Vec<String> {
        extract(content).into_iter().map(|s| s.specifier).collect()
    }

    #[test]
    fn dot_count_sets_ancestor_hops() {
        let content = "from .models import User\nfrom ..core.db import session\nfrom ...shared import util\n";
        assert_eq!(specs(content), vec!["./models", "../core/db", "../../shared"]);
    }

    #[test]
    fn bare_dot_imports_each_sibling() {
        let content = "from . import views, forms as f\nfrom . import (\n    admin,\n    urls,\n)\n";
        assert_eq!(specs(content), vec!["./views", "./forms", "./admin", "./urls"]);
    }

    #[test]
    fn absolute_imports_are_ignored() {
        assert!(specs("import os\nfrom typing import List\nfrom pkg.sub import thing\n").is_empty());
    }

    #[test]
    fn star_import_from_package_is_skipped() {
        assert_eq!(specs("from .helpers import *\nfrom . import *\n"), vec!["./helpers"]);
    }
}
