//! Repository file index built from directory listings.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::domain::default_deny_dirs;
use crate::fetch::{DirEntry, DirectoryLister, EntryKind};
use crate::scan::filter::PathFilter;
use crate::utils::is_denied_dir;
use crate::utils::paths::{file_name, normalize_segments, split_extension};

/// Flat set of every known file path in the repository.
///
/// Built once per run and read-only afterwards. `is_complete` is false when
/// traversal hit a listing failure, the deadline or the entry cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryIndex {
    paths: BTreeSet<String>,
    by_stem: BTreeMap<String, BTreeSet<String>>,
    complete: bool,
}

impl RepositoryIndex {
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self { complete: true, ..Self::default() };
        for path in paths {
            index.insert(path.as_ref());
        }
        index
    }

    fn insert(&mut self, path: &str) -> bool {
        let path = normalize_segments(path);
        if path.is_empty() || self.paths.contains(&path) {
            return false;
        }
        let (stem, _) = split_extension(file_name(&path));
        self.by_stem.entry(stem.to_string()).or_default().insert(path.clone());
        self.paths.insert(path);
        true
    }

    /// Add paths known from elsewhere (the changed files of the run).
    pub fn extend<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.insert(path.as_ref());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Paths in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.paths.iter()
    }

    /// Paths whose extension-stripped file name equals `stem`, sorted.
    pub fn paths_with_stem<'a>(&'a self, stem: &str) -> impl Iterator<Item = &'a String> + 'a {
        self.by_stem.get(stem).into_iter().flat_map(|set| set.iter())
    }
}

/// Traverses a [`DirectoryLister`] from the root into a [`RepositoryIndex`].
pub struct IndexBuilder<'a> {
    lister: &'a dyn DirectoryLister,
    filter: PathFilter,
    deny_dirs: Vec<String>,
    reference: Option<String>,
    timeout: Option<Duration>,
    max_entries: usize,
    concurrency: usize,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(lister: &'a dyn DirectoryLister) -> Self {
        Self {
            lister,
            filter: PathFilter::default(),
            deny_dirs: default_deny_dirs(),
            reference: None,
            timeout: None,
            max_entries: 0,
            concurrency: 8,
        }
    }

    pub fn filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn deny_dirs(mut self, dirs: Vec<String>) -> Self {
        self.deny_dirs = dirs;
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Stop traversal after `timeout`, keeping what was collected.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop after this many files; 0 disables the cap.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the index. Never fails: listing errors, the deadline and the
    /// entry cap all yield a partial index.
    pub async fn build(&self) -> RepositoryIndex {
        let mut paths = BTreeSet::new();
        let complete = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.traverse(&mut paths)).await {
                Ok(complete) => complete,
                Err(_) => {
                    tracing::warn!(
                        "Repository index timed out after {:?}; continuing with {} files",
                        limit,
                        paths.len()
                    );
                    false
                }
            },
            None => self.traverse(&mut paths).await,
        };

        let mut index = RepositoryIndex::from_paths(&paths);
        index.complete = complete;
        tracing::info!("Indexed {} repository files (complete: {})", index.len(), complete);
        index
    }

    async fn traverse(&self, paths: &mut BTreeSet<String>) -> bool {
        let mut complete = true;
        let mut frontier = vec![String::new()];
        let reference = self.reference.as_deref();

        while !frontier.is_empty() {
            let listings: Vec<(String, Result<Vec<DirEntry>, _>)> =
                stream::iter(std::mem::take(&mut frontier))
                    .map(|dir| async move {
                        let result = self.lister.list_directory(&dir, reference).await;
                        (dir, result)
                    })
                    .buffer_unordered(self.concurrency)
                    .collect()
                    .await;

            let mut next = Vec::new();
            for (dir, result) in listings {
                let entries = match result {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::warn!("Failed to list directory '{}': {}", dir, e);
                        complete = false;
                        continue;
                    }
                };

                for entry in entries {
                    let path = normalize_segments(&entry.path);
                    match entry.kind {
                        EntryKind::File => {
                            if !self.filter.matches(&path) {
                                continue;
                            }
                            paths.insert(path);
                            if self.max_entries > 0 && paths.len() >= self.max_entries {
                                tracing::warn!("Repository index reached {} entries; stopping", self.max_entries);
                                return false;
                            }
                        }
                        EntryKind::Dir => {
                            if is_denied_dir(file_name(&path), &self.deny_dirs) || self.filter.excludes_dir(&path) {
                                tracing::debug!("Skipping directory {}", path);
                                continue;
                            }
                            next.push(path);
                        }
                    }
                }
            }
            next.sort();
            frontier = next;
        }

        complete
    }
}
