//! Java imports and class heritage.
//!
//! `import com.acme.Foo;` becomes `/<source root>/com/acme/Foo.java`. The
//! source root is derived from the importing file's own package declaration,
//! falling back to the Maven layout. Test sources under `src/test/java` also
//! look in the matching `src/main/java`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::domain::{RawSpecifier, RelationKind};
use crate::utils::paths::parent_dir;

const PLATFORM_PREFIXES: &[&str] = &["java.", "javax.", "jdk.", "sun.", "com.sun."];
const DEFAULT_ROOT: &str = "src/main/java";

static PACKAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());
static IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(static\s+)?([\w.]+?)(\.\*)?\s*;").unwrap());
static EXTENDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|interface)\s+\w+(?:\s*<[^{]*?>)?\s+extends\s+([\w.<>,\s]+?)\s*(?:implements\b|\{)").unwrap()
});
static IMPLEMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bimplements\s+([\w.<>,\s]+?)\s*\{").unwrap());
static GENERIC_ARGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());

/// Source roots, most specific first.
fn source_roots(path: &str, content: &str) -> Vec<String> {
    let dir = parent_dir(path);
    let mut roots = Vec::new();

    if let Some(pkg) = PACKAGE.captures(content).and_then(|c| c.get(1)) {
        let pkg_dir = pkg.as_str().replace('.', "/");
        if dir == pkg_dir {
            roots.push(String::new());
        } else if let Some(root) = dir.strip_suffix(&format!("/{pkg_dir}")) {
            roots.push(root.to_string());
        }
    }
    if roots.is_empty() {
        for marker in ["src/main/java", "src/test/java"] {
            if let Some(idx) = dir.find(marker) {
                roots.push(dir[..idx + marker.len()].to_string());
                break;
            }
        }
    }
    if roots.is_empty() {
        roots.push(DEFAULT_ROOT.to_string());
    }

    if let Some(main_root) = roots[0].strip_suffix("src/test/java").map(|prefix| format!("{prefix}src/main/java")) {
        roots.push(main_root);
    }
    roots
}

fn class_path(root: &str, qualified: &str) -> String {
    let rel = format!("{}.java", qualified.replace('.', "/"));
    if root.is_empty() {
        format!("/{rel}")
    } else {
        format!("/{root}/{rel}")
    }
}

fn heritage_names(list: &str) -> Vec<String> {
    let mut cleaned = list.to_string();
    while GENERIC_ARGS.is_match(&cleaned) {
        cleaned = GENERIC_ARGS.replace_all(&cleaned, "").into_owned();
    }
    cleaned
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

pub fn extract(path: &str, content: &str) -> Vec<RawSpecifier> {
    let roots = source_roots(path, content);
    let mut out = Vec::new();
    // simple class name -> index of its first import specifier in `out`
    let mut imported: HashMap<String, usize> = HashMap::new();

    for cap in IMPORT.captures_iter(content) {
        let is_static = cap.get(1).is_some();
        let is_wildcard = cap.get(3).is_some();
        let Some(name) = cap.get(2).map(|m| m.as_str()) else { continue };
        if is_wildcard || PLATFORM_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }
        // `import static pkg.Class.member;` refers to `pkg.Class`
        let class = if is_static {
            match name.rsplit_once('.') {
                Some((class, _)) => class,
                None => continue,
            }
        } else {
            name
        };
        let simple = class.rsplit('.').next().unwrap_or(class).to_string();
        imported.entry(simple).or_insert(out.len());
        for root in &roots {
            out.push(RawSpecifier::exact(class_path(root, class), RelationKind::Import));
        }
    }

    let mut heritage = Vec::new();
    for cap in EXTENDS.captures_iter(content) {
        if let Some(list) = cap.get(1) {
            heritage.extend(heritage_names(list.as_str()).into_iter().map(|n| (n, RelationKind::Extends)));
        }
    }
    for cap in IMPLEMENTS.captures_iter(content) {
        if let Some(list) = cap.get(1) {
            heritage.extend(heritage_names(list.as_str()).into_iter().map(|n| (n, RelationKind::Implements)));
        }
    }

    for (name, kind) in heritage {
        if let Some(&idx) = imported.get(&name) {
            // the import already points at the class; record the stronger relation
            for spec in out.iter_mut().skip(idx).take(roots.len()) {
                spec.kind = kind;
            }
        } else if name.contains('.') {
            for root in &roots {
                out.push(RawSpecifier::exact(class_path(root, &name), kind));
            }
        } else {
            out.push(RawSpecifier::exact(format!("./{name}.java"), kind));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(path: &str, content: &str) -> Vec<(String, RelationKind)> {
        extract(path, content).into_iter().map(|s| (s.specifier, s.kind)).collect()
    }

    #[test]
    fn imports_map_under_package_root() {
        let content = "package com.acme.web;\n\nimport com.acme.core.Service;\nimport java.util.List;\nimport com.acme.util.*;\n";
        let found = pairs("app/src/main/java/com/acme/web/Controller.java", content);
        assert_eq!(
            found,
            vec![("/app/src/main/java/com/acme/core/Service.java".to_string(), RelationKind::Import)]
        );
    }

    #[test]
    fn test_sources_also_look_in_main_root() {
        let content = "package com.acme;\nimport com.acme.fixtures.Builder;\n";
        let found = pairs("src/test/java/com/acme/ServiceTest.java", content);
        assert_eq!(
            found,
            vec![
                ("/src/test/java/com/acme/fixtures/Builder.java".to_string(), RelationKind::Import),
                ("/src/main/java/com/acme/fixtures/Builder.java".to_string(), RelationKind::Import),
            ]
        );
    }

    #[test]
    fn static_imports_refer_to_their_class() {
        let content = "package a;\nimport static a.util.Strings.join;\n";
        assert_eq!(pairs("a/Main.java", content), vec![("/a/util/Strings.java".to_string(), RelationKind::Import)]);
    }

    #[test]
    fn heritage_to_same_package_and_imported_classes() {
        let content = r#"
package com.acme;

import com.acme.base.AbstractRepo;

public class UserRepo extends AbstractRepo<User> implements Repo<User, Long>, Auditable {
}
"#;
        let found = pairs("src/main/java/com/acme/UserRepo.java", content);
        assert_eq!(
            found,
            vec![
                ("/src/main/java/com/acme/base/AbstractRepo.java".to_string(), RelationKind::Extends),
                ("./Repo.java".to_string(), RelationKind::Implements),
                ("./Auditable.java".to_string(), RelationKind::Implements),
            ]
        );
    }

    #[test]
    fn class_specifiers_are_exact() {
        let content = "package com.acme;\nimport org.slf4j.Logger;\npublic class A extends Base {}\n";
        let found = extract("src/main/java/com/acme/A.java", content);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.exact));
    }

    #[test]
    fn files_without_package_use_default_root() {
        let found = pairs("Loose.java", "import org.lib.Thing;\n");
        assert_eq!(found, vec![("/src/main/java/org/lib/Thing.java".to_string(), RelationKind::Import)]);
    }
}
