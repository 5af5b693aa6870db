//! In-memory repository

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{ContentStore, DiffSource, DirEntry, DirectoryLister};
use crate::domain::{ChangedFile, FileStatus};
use crate::errors::RemoteError;
use crate::utils::paths::{normalize_segments, parent_dir};

/// A repository held entirely in memory.
///
/// Directories are implied by file paths. Listing failures can be injected
/// per directory, and the diff source can be switched off, to exercise the
/// degradation paths of an analysis run.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    files: BTreeMap<String, String>,
    binary: BTreeSet<String>,
    changed: Vec<ChangedFile>,
    diffs: HashMap<String, String>,
    failing_dirs: BTreeSet<String>,
    failing_content: BTreeSet<String>,
    diff_unavailable: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(normalize_segments(path), content.to_string());
        self
    }

    /// A file that exists but has no readable text.
    pub fn with_binary_file(mut self, path: &str) -> Self {
        let path = normalize_segments(path);
        self.files.insert(path.clone(), String::new());
        self.binary.insert(path);
        self
    }

    pub fn with_change(mut self, path: &str, status: FileStatus) -> Self {
        self.changed.push(ChangedFile::new(normalize_segments(path), status));
        self
    }

    pub fn with_diff(mut self, path: &str, patch: &str) -> Self {
        self.diffs.insert(normalize_segments(path), patch.to_string());
        self
    }

    /// Listing `dir` fails; its subtree never reaches the index.
    pub fn failing_dir(mut self, dir: &str) -> Self {
        self.failing_dirs.insert(normalize_segments(dir));
        self
    }

    pub fn failing_content(mut self, path: &str) -> Self {
        self.failing_content.insert(normalize_segments(path));
        self
    }

    pub fn without_diff_source(mut self) -> Self {
        self.diff_unavailable = true;
        self
    }
}

#[async_trait]
impl DiffSource for MemoryRepository {
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, RemoteError> {
        if self.diff_unavailable {
            return Err(RemoteError::Unavailable("diff source".to_string()));
        }
        Ok(self.changed.clone())
    }
}

#[async_trait]
impl ContentStore for MemoryRepository {
    async fn file_content(
        &self,
        path: &str,
        _reference: Option<&str>,
    ) -> Result<Option<String>, RemoteError> {
        if self.failing_content.contains(path) {
            return Err(RemoteError::Unavailable(format!("content of {path}")));
        }
        if self.binary.contains(path) {
            return Ok(None);
        }
        Ok(self.files.get(path).cloned())
    }

    async fn file_diff(&self, path: &str) -> Result<String, RemoteError> {
        Ok(self.diffs.get(path).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DirectoryLister for MemoryRepository {
    async fn list_directory(
        &self,
        path: &str,
        _reference: Option<&str>,
    ) -> Result<Vec<DirEntry>, RemoteError> {
        let dir = normalize_segments(path);
        if self.failing_dirs.contains(&dir) {
            return Err(RemoteError::Unavailable(format!("listing of '{dir}'")));
        }

        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        let mut entries = BTreeMap::new();
        for file in self.files.keys() {
            let Some(rest) = file.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child_dir, _)) => {
                    let child = format!("{prefix}{child_dir}");
                    entries.entry(child.clone()).or_insert_with(|| DirEntry::dir(child));
                }
                None => {
                    entries.insert(file.clone(), DirEntry::file(file.clone()));
                }
            }
        }

        if entries.is_empty() && !dir.is_empty() && !self.has_dir(&dir) {
            return Err(RemoteError::Unavailable(format!("directory '{dir}'")));
        }
        Ok(entries.into_values().collect())
    }
}

impl MemoryRepository {
    fn has_dir(&self, dir: &str) -> bool {
        self.files.keys().any(|f| {
            let mut current = parent_dir(f);
            loop {
                if current == dir {
                    return true;
                }
                if current.is_empty() {
                    return false;
                }
                current = parent_dir(current);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::EntryKind;

    fn repo() -> MemoryRepository {
        MemoryRepository::new()
            .with_file("src/a.ts", "export const a = 1;")
            .with_file("src/lib/b.ts", "export const b = 2;")
            .with_file("README.md", "# demo")
    }

    #[tokio::test]
    async fn lists_root_with_implied_directories() {
        let entries = repo().list_directory("", None).await.expect("listing");
        assert_eq!(entries, vec![DirEntry::file("README.md"), DirEntry::dir("src")]);
    }

    #[tokio::test]
    async fn lists_nested_directory() {
        let entries = repo().list_directory("src", None).await.expect("listing");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.path == "src/lib" && e.kind == EntryKind::Dir));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let repo = repo().failing_dir("src").without_diff_source();
        assert!(repo.list_directory("src", None).await.is_err());
        assert!(repo.list_changed_files().await.is_err());
    }

    #[tokio::test]
    async fn binary_files_have_no_content() {
        let repo = repo().with_binary_file("logo.png");
        assert_eq!(repo.file_content("logo.png", None).await.expect("content"), None);
        assert!(repo.file_content("src/a.ts", None).await.expect("content").is_some());
    }
}
