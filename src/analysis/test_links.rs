//! Test association: naming conventions plus import-based inference.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::FileRecord;
use crate::scan::RepositoryIndex;
use crate::utils::paths::{ancestors, file_name, join, parent_dir, split_extension};

const TEST_DIRS: &[&str] = &["", "__tests__", "tests", "test"];
const ANCESTOR_LEVELS: usize = 3;
const SOURCE_ROOTS: &[&str] = &["src", "lib", "app"];

/// Conventional test file names for a source file name.
pub fn test_names(name: &str) -> Vec<String> {
    let (stem, ext) = split_extension(name);
    let mut names = vec![
        format!("{stem}.test{ext}"),
        format!("{stem}.spec{ext}"),
        format!("{stem}_test{ext}"),
        format!("test_{stem}{ext}"),
    ];
    match ext.to_ascii_lowercase().as_str() {
        ".java" => {
            names.push(format!("{stem}Test{ext}"));
            names.push(format!("{stem}Tests{ext}"));
        }
        ".rb" => names.push(format!("{stem}_spec{ext}")),
        _ => {}
    }
    names
}

/// Directories searched for tests of a file living in `dir`, nearest first.
pub fn test_locations(dir: &str) -> Vec<String> {
    let mut locations: Vec<String> = Vec::new();
    let mut push = |loc: String| {
        if !locations.contains(&loc) {
            locations.push(loc);
        }
    };

    for ancestor in ancestors(dir, ANCESTOR_LEVELS) {
        for test_dir in TEST_DIRS {
            push(join(&[&ancestor, test_dir]));
        }
    }

    // tests/ trees mirroring the source tree
    for ancestor in ancestors(dir, ANCESTOR_LEVELS).into_iter().skip(1) {
        let relative = if ancestor.is_empty() {
            dir
        } else {
            dir.strip_prefix(&format!("{ancestor}/")).unwrap_or(dir)
        };
        let mut variants = vec![relative];
        if let Some((first, rest)) = relative.split_once('/') {
            if SOURCE_ROOTS.contains(&first) {
                variants.push(rest);
            }
        } else if SOURCE_ROOTS.contains(&relative) {
            variants.push("");
        }
        for variant in variants {
            for test_dir in TEST_DIRS.iter().skip(1) {
                push(join(&[&ancestor, test_dir, variant]));
            }
        }
    }

    // Maven and Gradle layouts
    if let Some(idx) = dir.find("src/main") {
        let at_segment = idx == 0 || dir[..idx].ends_with('/');
        let rest = &dir[idx + "src/main".len()..];
        if at_segment && (rest.is_empty() || rest.starts_with('/')) {
            push(format!("{}src/test{}", &dir[..idx], rest));
        }
    }

    locations
}

/// Every conventional test path for `path`, whether it exists or not.
pub fn test_candidates(path: &str) -> Vec<String> {
    let names = test_names(file_name(path));
    let mut candidates = Vec::new();
    for location in test_locations(parent_dir(path)) {
        for name in &names {
            candidates.push(join(&[&location, name]));
        }
    }
    candidates
}

/// Populate `test_files` for every non-test record.
///
/// A naming candidate counts when it is a known record or indexed. Test
/// records that depend on a file are its tests too. Requires a built graph.
/// Returns the number of distinct tests found.
pub fn associate_tests(records: &mut BTreeMap<String, FileRecord>, index: &RepositoryIndex) -> usize {
    let mut found: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for record in records.values().filter(|r| !r.is_test()) {
        let mut tests: BTreeSet<String> = test_candidates(&record.path)
            .into_iter()
            .filter(|c| c != &record.path && (records.contains_key(c) || index.contains(c)))
            .collect();

        for test in records.values().filter(|r| r.is_test() && r.depends_on(&record.path)) {
            tracing::debug!("{} imports {}", test.path, record.path);
            tests.insert(test.path.clone());
        }
        found.insert(record.path.clone(), tests);
    }

    for record in records.values_mut() {
        record.test_files = found.remove(&record.path).unwrap_or_default();
    }

    let all: BTreeSet<&String> = records.values().flat_map(|r| r.test_files.iter()).collect();
    tracing::info!("Associated {} test files", all.len());
    all.len()
}
