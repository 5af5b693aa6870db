//! Syntax-tree extraction for JavaScript and TypeScript sources.

use tree_sitter::{Language, Node, Parser, Tree};

use crate::domain::{RawSpecifier, RelationKind};
use crate::errors::ExtractError;

/// Grammar selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Grammar {
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            ".js" | ".mjs" | ".cjs" | ".jsx" => Some(Grammar::JavaScript),
            ".ts" | ".mts" | ".cts" => Some(Grammar::TypeScript),
            ".tsx" => Some(Grammar::Tsx),
            _ => None,
        }
    }

    fn language(self) -> Language {
        match self {
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Parse `content` and collect module specifiers in source order.
///
/// The parser recovers from syntax errors, so a file with a broken function
/// still yields the imports around it. Only a missing tree is an error.
pub fn extract(path: &str, content: &str, grammar: Grammar) -> Result<Vec<RawSpecifier>, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(&grammar.language())?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| ExtractError::NoTree(path.to_string()))?;
    if tree.root_node().has_error() {
        tracing::debug!("{} parsed with syntax errors; keeping recovered nodes", path);
    }
    Ok(collect_specifiers(&tree, content.as_bytes()))
}

/// Walk the tree with an explicit stack, children pushed in reverse so nodes
/// pop in source order.
pub fn collect_specifiers(tree: &Tree, source: &[u8]) -> Vec<RawSpecifier> {
    let mut found = Vec::new();
    let mut stack = vec![tree.root_node()];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                if let Some(spec) = node.child_by_field_name("source").and_then(|s| string_value(s, source)) {
                    found.push(RawSpecifier::new(spec, RelationKind::Import));
                } else if let Some(spec) = import_require_source(node, source) {
                    // `import x = require("./x")`
                    found.push(RawSpecifier::new(spec, RelationKind::Require));
                }
            }
            "export_statement" => {
                if let Some(spec) = node.child_by_field_name("source").and_then(|s| string_value(s, source)) {
                    found.push(RawSpecifier::new(spec, RelationKind::Import));
                }
            }
            "call_expression" => {
                if let Some(found_call) = call_specifier(node, source) {
                    found.push(found_call);
                }
            }
            _ => {}
        }

        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    found
}

fn import_require_source(node: Node, source: &[u8]) -> Option<String> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .find(|c| c.kind() == "import_require_clause")
        .and_then(|clause| clause.child_by_field_name("source"))
        .and_then(|s| string_value(s, source))
}

/// `require("x")` and `import("x")` with a literal first argument.
fn call_specifier(node: Node, source: &[u8]) -> Option<RawSpecifier> {
    let callee = node.child_by_field_name("function")?;
    let kind = match callee.kind() {
        "import" => RelationKind::Import,
        "identifier" if callee.utf8_text(source).ok()? == "require" => RelationKind::Require,
        _ => return None,
    };
    let args = node.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    let spec = string_value(first, source)?;
    Some(RawSpecifier::new(spec, kind))
}

fn string_value(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let text = node.utf8_text(source).ok()?;
    let inner = text.trim_matches(|c: char| c == '"' || c == '\'');
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(content: &str, grammar: Grammar) -> Vec<(String, RelationKind)> {
        extract("src/file", content, grammar)
            .expect("parse")
            .into_iter()
            .map(|s| (s.specifier, s.kind))
            .collect()
    }

    #[test]
    fn collects_static_require_and_dynamic_forms_in_order() {
        let content = r#"
import React from 'react';
import { add } from "./math";
const fs = require('fs');
const util = require("./util");
async function load() { return import('./lazy'); }
export { helper } from './helper';
"#;
        let found = specs(content, Grammar::JavaScript);
        assert_eq!(
            found,
            vec![
                ("react".to_string(), RelationKind::Import),
                ("./math".to_string(), RelationKind::Import),
                ("fs".to_string(), RelationKind::Require),
                ("./util".to_string(), RelationKind::Require),
                ("./lazy".to_string(), RelationKind::Import),
                ("./helper".to_string(), RelationKind::Import),
            ]
        );
    }

    #[test]
    fn non_literal_arguments_are_ignored() {
        let found = specs("const m = require(name); import(path);", Grammar::JavaScript);
        assert!(found.is_empty());
    }

    #[test]
    fn typescript_type_imports_and_import_equals() {
        let content = "import type { Shape } from './shape';\nimport legacy = require('./legacy');\n";
        let found = specs(content, Grammar::TypeScript);
        assert!(found.contains(&("./shape".to_string(), RelationKind::Import)));
        assert!(found.contains(&("./legacy".to_string(), RelationKind::Require)));
    }

    #[test]
    fn tsx_components_parse() {
        let content = "import { Button } from './Button';\nexport const App = () => <Button label=\"x\" />;\n";
        assert_eq!(specs(content, Grammar::Tsx), vec![("./Button".to_string(), RelationKind::Import)]);
    }

    #[test]
    fn syntax_errors_keep_surrounding_imports() {
        let content = "import { a } from './a';\nfunction broken( {\nimport { b } from './b';\n";
        let found = specs(content, Grammar::TypeScript);
        assert!(found.iter().any(|(s, _)| s == "./a"));
    }

    #[test]
    fn grammar_selection_by_extension() {
        assert_eq!(Grammar::for_extension(".mjs"), Some(Grammar::JavaScript));
        assert_eq!(Grammar::for_extension(".tsx"), Some(Grammar::Tsx));
        assert_eq!(Grammar::for_extension(".py"), None);
    }
}
