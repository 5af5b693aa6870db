//! Repository collaborators (GitHub, local checkout, in-memory)
//!
//! The analysis core never touches a filesystem or network directly. It
//! talks to three narrow async interfaces:
//! - [`DiffSource`] lists the files changed by the change request
//! - [`ContentStore`] returns file contents and per-file patches
//! - [`DirectoryLister`] lists one directory, used to build the index
//!
//! Implementations:
//! - [`github::GitHubClient`] talks to the GitHub REST API
//! - [`local::LocalRepository`] reads a checkout and diffs it with git
//! - [`memory::MemoryRepository`] serves fixed in-memory data

use async_trait::async_trait;

use crate::domain::ChangedFile;
use crate::errors::RemoteError;

pub mod github;
pub mod local;
pub mod memory;

pub use github::GitHubClient;
pub use local::LocalRepository;
pub use memory::MemoryRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing, with a repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::File }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::Dir }
    }
}

#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Files modified by the current change request, in source order.
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, RemoteError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Text of `path` at `reference` (the store's head revision when `None`).
    ///
    /// `Ok(None)` means the file exists but has no readable text (binary,
    /// deleted, too large).
    async fn file_content(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<String>, RemoteError>;

    /// Unified-diff patch of `path` in the change request; empty if none.
    async fn file_diff(&self, path: &str) -> Result<String, RemoteError>;
}

#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Direct children of `path` (`""` is the repository root).
    async fn list_directory(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Vec<DirEntry>, RemoteError>;
}
