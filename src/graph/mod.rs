//! Dependency graph over the changed files.
//!
//! Pass 1 extracts and resolves outgoing edges for every record with content,
//! in parallel. Pass 2 assigns them and mirrors each edge whose target is a
//! known record into that record's `dependents`.

use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{DependencyEdge, Dependent, FileRecord};
use crate::extract::extract_specifiers;
use crate::resolve::PathResolver;
use crate::scan::RepositoryIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub files_analyzed: usize,
    pub edges: usize,
    pub mirrored: usize,
    pub low_confidence: usize,
}

/// Resolve the outgoing edges of one file.
///
/// One edge per target. When two specifiers reach the same target, the
/// edge keeps the position of the first and the more confident resolution.
pub fn resolve_edges(path: &str, content: &str, resolver: &PathResolver<'_>) -> Vec<DependencyEdge> {
    let mut edges: Vec<DependencyEdge> = Vec::new();
    let mut by_target: HashMap<String, usize> = HashMap::new();

    for raw in extract_specifiers(path, content) {
        let Some(resolution) = resolver.resolve_raw(path, &raw) else {
            tracing::debug!("{}: dropped unresolved '{}'", path, raw.specifier);
            continue;
        };
        let edge = DependencyEdge {
            path: resolution.path,
            kind: raw.kind,
            raw_import: Some(raw.specifier),
            confidence: resolution.confidence,
        };
        match by_target.get(&edge.path) {
            Some(&idx) => {
                if edge.confidence < edges[idx].confidence {
                    edges[idx] = edge;
                }
            }
            None => {
                by_target.insert(edge.path.clone(), edges.len());
                edges.push(edge);
            }
        }
    }
    edges
}

/// Populate `dependencies` and `dependents` on every record.
///
/// Runs to completion before test association starts. Records without
/// content contribute no outgoing edges but still receive dependents.
pub fn build_graph(records: &mut BTreeMap<String, FileRecord>, index: &RepositoryIndex) -> GraphStats {
    let resolver = PathResolver::new(index);

    let resolved: Vec<(String, Vec<DependencyEdge>)> = records
        .par_iter()
        .filter_map(|(path, record)| {
            let content = record.content.as_deref()?;
            Some((path.clone(), resolve_edges(path, content, &resolver)))
        })
        .collect();

    let mut stats = GraphStats { files_analyzed: resolved.len(), ..GraphStats::default() };
    for record in records.values_mut() {
        record.dependencies.clear();
        record.dependents.clear();
    }

    for (source, edges) in resolved {
        for edge in &edges {
            stats.edges += 1;
            if edge.confidence.is_low() {
                stats.low_confidence += 1;
            }
            if let Some(target) = records.get_mut(&edge.path) {
                target.dependents.insert(Dependent { path: source.clone(), kind: edge.kind });
                stats.mirrored += 1;
            }
        }
        if let Some(record) = records.get_mut(&source) {
            record.dependencies = edges;
        }
    }

    tracing::info!(
        "Dependency graph: {} files analyzed, {} edges ({} between changed files, {} low confidence)",
        stats.files_analyzed,
        stats.edges,
        stats.mirrored,
        stats.low_confidence
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, FileStatus, RelationKind};

    fn record(path: &str, content: Option<&str>) -> FileRecord {
        FileRecord::new(path, FileStatus::Modified).with_content(content.map(str::to_string))
    }

    fn records(items: Vec<FileRecord>) -> BTreeMap<String, FileRecord> {
        items.into_iter().map(|r| (r.path.clone(), r)).collect()
    }

    #[test]
    fn edges_are_mirrored_between_known_records() {
        let mut map = records(vec![
            record("src/util.ts", Some("import { x } from './helpers';\nimport React from 'react';\n")),
            record("src/helpers.ts", Some("export const x = 1;\n")),
        ]);
        let index = RepositoryIndex::from_paths(["src/util.ts", "src/helpers.ts"]);
        let stats = build_graph(&mut map, &index);

        let util = &map["src/util.ts"];
        assert_eq!(util.dependencies.len(), 1);
        assert_eq!(util.dependencies[0].path, "src/helpers.ts");
        assert_eq!(util.dependencies[0].kind, RelationKind::Import);
        assert_eq!(util.dependencies[0].raw_import.as_deref(), Some("./helpers"));

        let helpers = &map["src/helpers.ts"];
        assert!(helpers
            .dependents
            .contains(&Dependent { path: "src/util.ts".to_string(), kind: RelationKind::Import }));
        assert_eq!(stats.mirrored, 1);
    }

    #[test]
    fn indexed_targets_outside_the_change_get_no_dependents_side() {
        let mut map = records(vec![record("src/a.js", Some("const b = require('./b');\n"))]);
        let index = RepositoryIndex::from_paths(["src/a.js", "src/b.js"]);
        let stats = build_graph(&mut map, &index);
        assert_eq!(map["src/a.js"].dependencies[0].path, "src/b.js");
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.mirrored, 0);
    }

    #[test]
    fn records_without_content_still_receive_dependents() {
        let mut map = records(vec![
            record("src/a.ts", Some("import './removed';\n")),
            record("src/removed.ts", None),
        ]);
        let index = RepositoryIndex::from_paths(["src/a.ts", "src/removed.ts"]);
        build_graph(&mut map, &index);
        assert!(map["src/removed.ts"].dependencies.is_empty());
        assert_eq!(map["src/removed.ts"].dependents.len(), 1);
    }

    #[test]
    fn duplicate_targets_keep_the_most_confident_edge() {
        let index = RepositoryIndex::from_paths(["src/app.ts", "lib/logger.ts"]);
        let resolver = PathResolver::new(&index);
        // the first specifier is found by ancestor search, the second by extension probing
        let content = "import a from './nowhere/logger';\nimport b from '/lib/logger';\n";
        let edges = resolve_edges("src/app.ts", content, &resolver);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].confidence, Confidence::Probed);
        assert_eq!(edges[0].raw_import.as_deref(), Some("/lib/logger"));
    }

    #[test]
    fn rebuilding_is_stable() {
        let mut map = records(vec![
            record("src/a.ts", Some("import { b } from './b';\n")),
            record("src/b.ts", Some("import { a } from './a';\n")),
        ]);
        let index = RepositoryIndex::from_paths(["src/a.ts", "src/b.ts"]);
        build_graph(&mut map, &index);
        let first = map.clone();
        build_graph(&mut map, &index);
        assert_eq!(first["src/a.ts"].dependents, map["src/a.ts"].dependents);
        assert_eq!(first["src/b.ts"].dependencies, map["src/b.ts"].dependencies);
    }
}
