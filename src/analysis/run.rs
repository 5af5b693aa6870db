//! One analysis run: index, changed files, graph, tests.
//!
//! Phases are strictly sequenced. Every record's content is loaded before
//! extraction begins, and the graph is closed before test association runs.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::analysis::test_links::associate_tests;
use crate::domain::{AnalysisReport, ChangedFile, Config, FileRecord, FileStatus, IndexConfig};
use crate::errors::AnalysisError;
use crate::fetch::{ContentStore, DiffSource, DirectoryLister};
use crate::graph::build_graph;
use crate::scan::{IndexBuilder, PathFilter, RepositoryIndex};
use crate::utils::normalize_path;
use crate::utils::paths::normalize_segments;

/// The collaborators a run reads from.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    pub diff: &'a dyn DiffSource,
    pub content: &'a dyn ContentStore,
    pub lister: &'a dyn DirectoryLister,
}

impl<'a> Sources<'a> {
    /// Use one repository for all three roles.
    pub fn from_repository<R>(repo: &'a R) -> Self
    where
        R: DiffSource + ContentStore + DirectoryLister,
    {
        Self { diff: repo, content: repo, lister: repo }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub filter: PathFilter,
    /// 0 means unlimited.
    pub max_files: usize,
    pub fetch_concurrency: usize,
    pub index: IndexConfig,
    /// Revision for contents and listings; `None` uses the collaborator's default.
    pub reference: Option<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            filter: PathFilter::default(),
            max_files: 0,
            fetch_concurrency: 6,
            index: IndexConfig::default(),
            reference: None,
        }
    }
}

impl AnalysisOptions {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            filter: PathFilter::new(&config.path_filters)?,
            max_files: config.max_files,
            fetch_concurrency: config.fetch_concurrency.max(1),
            index: config.index.clone(),
            reference: None,
        })
    }
}

/// Per-run state, owned by the caller and discarded after use.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub records: BTreeMap<String, FileRecord>,
    pub index: RepositoryIndex,
    /// Eligible changed files dropped by the `max_files` cap.
    pub skipped: Vec<String>,
}

impl RunContext {
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::new(&self.records, self.index.is_complete(), self.index.len())
    }

    /// De-duplicated union of the tests of every non-test record, sorted.
    pub fn tests_to_modify(&self) -> Vec<String> {
        self.report().tests_to_modify
    }
}

/// Build the repository index with the run's limits.
pub async fn build_index(lister: &dyn DirectoryLister, options: &AnalysisOptions) -> RepositoryIndex {
    let timeout = (options.index.timeout_secs > 0).then(|| Duration::from_secs(options.index.timeout_secs));
    IndexBuilder::new(lister)
        .filter(options.filter.clone())
        .deny_dirs(options.index.deny_dirs.clone())
        .reference(options.reference.clone())
        .timeout(timeout)
        .max_entries(options.index.max_entries)
        .concurrency(options.index.concurrency)
        .build()
        .await
}

/// Keep filter-eligible files, first occurrence of each path, up to `max_files`.
///
/// Paths are brought into index form first, so `./src/a.ts` and
/// `src/a.ts` are the same record.
fn select_changed(changed: Vec<ChangedFile>, options: &AnalysisOptions) -> (Vec<ChangedFile>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    let mut skipped = Vec::new();

    for mut file in changed {
        file.path = normalize_segments(&normalize_path(&file.path));
        if file.path.is_empty() {
            continue;
        }
        if !seen.insert(file.path.clone()) {
            continue;
        }
        if !options.filter.matches(&file.path) {
            tracing::debug!("Skipping {} (path filter {})", file.path, options.filter);
            continue;
        }
        if options.max_files > 0 && selected.len() >= options.max_files {
            skipped.push(file.path);
            continue;
        }
        selected.push(file);
    }

    if !skipped.is_empty() {
        tracing::warn!("max_files = {} reached; skipping {} changed files", options.max_files, skipped.len());
    }
    (selected, skipped)
}

async fn load_record(content: &dyn ContentStore, file: ChangedFile, reference: Option<&str>) -> FileRecord {
    let diff = match content.file_diff(&file.path).await {
        Ok(diff) => diff,
        Err(e) => {
            tracing::warn!("Failed to fetch diff for {}: {}", file.path, e);
            String::new()
        }
    };

    let body = if file.status == FileStatus::Removed {
        None
    } else {
        match content.file_content(&file.path, reference).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to fetch content for {}: {}", file.path, e);
                None
            }
        }
    };

    FileRecord::new(file.path, file.status).with_diff(diff).with_content(body)
}

/// Run the full analysis.
///
/// Only a missing changed-file list is fatal. Index, content and diff
/// failures degrade the result instead.
pub async fn analyze(sources: Sources<'_>, options: &AnalysisOptions) -> Result<RunContext, AnalysisError> {
    let mut index = build_index(sources.lister, options).await;

    let changed = sources
        .diff
        .list_changed_files()
        .await
        .map_err(AnalysisError::ChangedFilesUnavailable)?;
    tracing::info!("{} changed files reported", changed.len());

    let (selected, skipped) = select_changed(changed, options);
    let reference = options.reference.as_deref();
    let loaded: Vec<FileRecord> = stream::iter(selected)
        .map(|file| load_record(sources.content, file, reference))
        .buffered(options.fetch_concurrency.max(1))
        .collect()
        .await;

    let mut records: BTreeMap<String, FileRecord> = loaded.into_iter().map(|r| (r.path.clone(), r)).collect();
    index.extend(records.keys());

    build_graph(&mut records, &index);
    associate_tests(&mut records, &index);

    Ok(RunContext { records, index, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryRepository;

    fn repo() -> MemoryRepository {
        MemoryRepository::new()
            .with_file("src/math.ts", "export const add = (a: number, b: number) => a + b;\n")
            .with_file("src/calc.ts", "import { add } from './math';\n")
            .with_file("src/math.test.ts", "import { add } from './math';\n")
            .with_file("docs/guide.md", "# guide\n")
            .with_change("src/calc.ts", FileStatus::Modified)
            .with_change("src/math.ts", FileStatus::Modified)
            .with_change("docs/guide.md", FileStatus::Modified)
            .with_diff("src/math.ts", "@@ -1 +1 @@\n-old\n+new\n")
    }

    #[tokio::test]
    async fn analyze_links_graph_and_tests() {
        let repo = repo();
        let ctx = analyze(Sources::from_repository(&repo), &AnalysisOptions::default()).await.expect("run");

        let math = &ctx.records["src/math.ts"];
        assert!(math.diff_text.contains("+new"));
        assert_eq!(math.dependents.len(), 1);
        assert!(math.test_files.contains("src/math.test.ts"));
        assert_eq!(ctx.tests_to_modify(), vec!["src/math.test.ts".to_string()]);
        assert!(ctx.index.is_complete());
    }

    #[test]
    fn changed_paths_are_normalized_and_deduplicated() {
        let changed = vec![
            ChangedFile::new("./src/a.ts", FileStatus::Modified),
            ChangedFile::new("src\\a.ts", FileStatus::Modified),
            ChangedFile::new("src/lib/../b.ts", FileStatus::Added),
        ];
        let (selected, skipped) = select_changed(changed, &AnalysisOptions::default());
        let paths: Vec<&str> = selected.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.ts", "src/b.ts"]);
        assert!(skipped.is_empty());
    }

    #[tokio::test]
    async fn filter_and_cap_scope_the_records() {
        let repo = repo();
        let options = AnalysisOptions {
            filter: PathFilter::new(&["!docs/**"]).expect("filter"),
            max_files: 1,
            ..AnalysisOptions::default()
        };
        let ctx = analyze(Sources::from_repository(&repo), &options).await.expect("run");
        assert_eq!(ctx.records.keys().collect::<Vec<_>>(), vec!["src/calc.ts"]);
        assert_eq!(ctx.skipped, vec!["src/math.ts".to_string()]);
    }

    #[tokio::test]
    async fn content_failures_leave_content_absent() {
        let repo = repo().failing_content("src/calc.ts");
        let ctx = analyze(Sources::from_repository(&repo), &AnalysisOptions::default()).await.expect("run");
        assert!(ctx.records["src/calc.ts"].content.is_none());
        assert!(ctx.records["src/calc.ts"].dependencies.is_empty());
        assert!(ctx.records["src/math.ts"].dependents.is_empty());
    }

    #[tokio::test]
    async fn removed_files_have_no_content() {
        let repo = repo().with_change("src/old.ts", FileStatus::Removed);
        let ctx = analyze(Sources::from_repository(&repo), &AnalysisOptions::default()).await.expect("run");
        let old = &ctx.records["src/old.ts"];
        assert_eq!(old.status, FileStatus::Removed);
        assert!(old.content.is_none());
        assert!(ctx.index.contains("src/old.ts"));
    }

    #[tokio::test]
    async fn missing_diff_source_is_fatal() {
        let repo = repo().without_diff_source();
        let err = analyze(Sources::from_repository(&repo), &AnalysisOptions::default()).await.expect_err("fatal");
        assert!(matches!(err, AnalysisError::ChangedFilesUnavailable(_)));
    }
}
