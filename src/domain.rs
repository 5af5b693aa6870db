//! Core data model shared by every analysis phase.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::utils::classify::is_test_file;
use crate::utils::paths::file_name;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// How one file refers to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Import,
    Require,
    Reference,
    Extends,
    Implements,
    Uses,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Import => "import",
            RelationKind::Require => "require",
            RelationKind::Reference => "reference",
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::Uses => "uses",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which resolver step produced a target path.
///
/// Ordered from most to least trustworthy. `Similar` edges come from the
/// basename fallback and may be false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    Probed,
    Ancestor,
    Similar,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::Probed => "probed",
            Confidence::Ancestor => "ancestor",
            Confidence::Similar => "similar",
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::Similar)
    }
}

/// An unresolved specifier as found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpecifier {
    pub specifier: String,
    pub kind: RelationKind,
    /// Resolve only to this exact path, with no probing or fallbacks.
    pub exact: bool,
}

impl RawSpecifier {
    pub fn new(specifier: impl Into<String>, kind: RelationKind) -> Self {
        Self { specifier: specifier.into(), kind, exact: false }
    }

    /// A specifier naming one concrete file, e.g. a Java class under a source root.
    pub fn exact(specifier: impl Into<String>, kind: RelationKind) -> Self {
        Self { specifier: specifier.into(), kind, exact: true }
    }
}

/// A resolved outgoing edge. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_import: Option<String>,
    pub confidence: Confidence,
}

/// The inverse side of a [`DependencyEdge`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Dependent {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
    Other,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Other => "other",
        }
    }

    /// Map a GitHub `pulls/files` status string.
    pub fn from_github(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "modified" | "changed" => FileStatus::Modified,
            "removed" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Other,
        }
    }
}

/// A file touched by the pull request, as reported by a diff source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self { path: path.into(), status }
    }
}

/// Per-file analysis record, keyed by `path` in the run context.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub status: FileStatus,
    #[serde(skip)]
    pub diff_text: String,
    #[serde(skip)]
    pub content: Option<String>,
    pub dependencies: Vec<DependencyEdge>,
    pub dependents: BTreeSet<Dependent>,
    pub test_files: BTreeSet<String>,
    is_test: bool,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            is_test: is_test_file(&path),
            path,
            status,
            diff_text: String::new(),
            content: None,
            dependencies: Vec::new(),
            dependents: BTreeSet::new(),
            test_files: BTreeSet::new(),
        }
    }

    pub fn with_diff(mut self, diff_text: impl Into<String>) -> Self {
        self.diff_text = diff_text.into();
        self
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    /// Computed once from the filename at construction.
    pub fn is_test(&self) -> bool {
        self.is_test
    }

    pub fn depends_on(&self, path: &str) -> bool {
        self.dependencies.iter().any(|d| d.path == path)
    }
}

/// Final output of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub schema_version: &'static str,
    pub generated_at: String,
    pub index_complete: bool,
    pub index_size: usize,
    pub files: Vec<FileRecord>,
    pub tests_to_modify: Vec<String>,
    pub untested_files: Vec<String>,
    pub low_confidence_edges: usize,
}

impl AnalysisReport {
    pub fn new(
        records: &BTreeMap<String, FileRecord>,
        index_complete: bool,
        index_size: usize,
    ) -> Self {
        let tests_to_modify: BTreeSet<String> = records
            .values()
            .filter(|r| !r.is_test())
            .flat_map(|r| r.test_files.iter().cloned())
            .collect();
        let untested_files = records
            .values()
            .filter(|r| !r.is_test() && r.test_files.is_empty())
            .map(|r| r.path.clone())
            .collect();
        let low_confidence_edges = records
            .values()
            .flat_map(|r| r.dependencies.iter())
            .filter(|d| d.confidence.is_low())
            .count();

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            index_complete,
            index_size,
            files: records.values().cloned().collect(),
            tests_to_modify: tests_to_modify.into_iter().collect(),
            untested_files,
            low_confidence_edges,
        }
    }

    /// Keep only the given paths (used to scope a report to a user command).
    ///
    /// A path may name a record or one of the tests to modify; a named test
    /// stays in `tests_to_modify` even when no kept record links to it.
    pub fn retain_files(&mut self, paths: &BTreeSet<String>) {
        self.files.retain(|f| paths.contains(&f.path));
        let named_tests: Vec<String> =
            self.tests_to_modify.iter().filter(|t| paths.contains(*t)).cloned().collect();
        let tests: BTreeSet<String> = self
            .files
            .iter()
            .filter(|f| !f.is_test())
            .flat_map(|f| f.test_files.iter().cloned())
            .chain(named_tests)
            .collect();
        self.tests_to_modify = tests.into_iter().collect();
        self.untested_files.retain(|p| paths.contains(p));
    }
}

/// Directories never descended into while building the repository index.
pub fn default_deny_dirs() -> Vec<String> {
    [
        "node_modules",
        "bower_components",
        "vendor",
        "dist",
        "build",
        "out",
        "target",
        "coverage",
        "__pycache__",
        "venv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub deny_dirs: Vec<String>,
    /// Traversal deadline; 0 disables it.
    pub timeout_secs: u64,
    /// Stop indexing after this many files; 0 disables it.
    pub max_entries: usize,
    pub concurrency: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { deny_dirs: default_deny_dirs(), timeout_secs: 120, max_entries: 50_000, concurrency: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_base_url: String,
    /// Environment variable holding the API token.
    pub token_env: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self { api_base_url: "https://api.github.com".to_string(), token_env: "GITHUB_TOKEN".to_string() }
    }
}

/// Run configuration. Precedence: CLI > Env > File > Defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Include/exclude rules; a leading `!` marks an exclude rule.
    #[serde(deserialize_with = "string_or_list")]
    pub path_filters: Vec<String>,
    /// Maximum number of changed files to analyze; 0 means unlimited.
    pub max_files: usize,
    pub fetch_concurrency: usize,
    pub debug: bool,
    pub index: IndexConfig,
    pub github: GitHubConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path_filters: Vec::new(),
            max_files: 0,
            fetch_concurrency: 6,
            debug: false,
            index: IndexConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

/// Accept either a list or a comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(v) => v,
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}
