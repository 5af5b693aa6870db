//! Local checkout collaborator

use async_trait::async_trait;
use git2::{Delta, DiffFormat, DiffOptions, ObjectType, Repository, Tree};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use super::{ContentStore, DiffSource, DirEntry, DirectoryLister};
use crate::domain::{ChangedFile, FileStatus};
use crate::errors::RemoteError;
use crate::utils::paths::normalize_segments;
use crate::utils::{decode_bytes, normalize_path};

/// Walk up from `start` looking for a `.git` directory.
///
/// Returns `start` unchanged when no ancestor holds one.
pub fn find_repo_root(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if current.join(".git").exists() {
            if current != start {
                tracing::info!(
                    "Using repository root {} (detected from {})",
                    current.display(),
                    start.display()
                );
            }
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    tracing::info!("No .git found; using {} as repository root", start.display());
    start.to_path_buf()
}

/// A repository checked out on local disk.
///
/// Changed files come from a git diff of `base` against `head` (or the
/// working tree when `head` is unset), or from an explicit list.
pub struct LocalRepository {
    root: PathBuf,
    base: String,
    head: Option<String>,
    explicit_changes: Option<Vec<String>>,
    respect_gitignore: bool,
}

impl LocalRepository {
    pub fn open(path: &Path) -> Result<Self, RemoteError> {
        let canonical = path.canonicalize().map_err(|e| RemoteError::io(path.display().to_string(), e))?;
        if !canonical.is_dir() {
            return Err(RemoteError::Unavailable(format!("directory {}", path.display())));
        }
        Ok(Self {
            root: find_repo_root(&canonical),
            base: "HEAD".to_string(),
            head: None,
            explicit_changes: None,
            respect_gitignore: true,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Revision the changes are measured against.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Revision holding the changes; the working tree when unset.
    pub fn head(mut self, head: Option<String>) -> Self {
        self.head = head;
        self
    }

    /// Use an explicit changed-file list. Absolute paths inside the
    /// checkout are made relative to its root.
    pub fn changed_files(mut self, files: Vec<String>) -> Self {
        let changes = files.iter().map(|f| self.relative_to_root(f)).collect();
        self.explicit_changes = Some(changes);
        self
    }

    fn relative_to_root(&self, file: &str) -> String {
        let path = Path::new(file);
        if path.is_absolute() {
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            for candidate in [canonical.as_path(), path] {
                if let Ok(rel) = candidate.strip_prefix(&self.root) {
                    return normalize_segments(&normalize_path(&rel.to_string_lossy()));
                }
            }
            tracing::warn!("{} is outside the repository root {}", file, self.root.display());
        }
        normalize_segments(&normalize_path(file))
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    fn repo(&self) -> Result<Repository, RemoteError> {
        Ok(Repository::open(&self.root)?)
    }

    fn diff<'r>(&self, repo: &'r Repository, pathspec: Option<&str>) -> Result<git2::Diff<'r>, RemoteError> {
        let base_tree = repo.revparse_single(&self.base)?.peel_to_tree()?;
        let mut opts = DiffOptions::new();
        if let Some(spec) = pathspec {
            opts.pathspec(spec).disable_pathspec_match(true);
        }
        let diff = match &self.head {
            Some(head) => {
                let head_tree = repo.revparse_single(head)?.peel_to_tree()?;
                repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))?
            }
            None => {
                opts.include_untracked(true).recurse_untracked_dirs(true);
                repo.diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))?
            }
        };
        Ok(diff)
    }

    fn head_tree<'r>(&self, repo: &'r Repository, reference: &str) -> Result<Tree<'r>, RemoteError> {
        Ok(repo.revparse_single(reference)?.peel_to_tree()?)
    }

    fn list_disk_directory(&self, path: &str) -> Vec<DirEntry> {
        let dir = if path.is_empty() { self.root.clone() } else { self.root.join(path) };
        let walker = WalkBuilder::new(&dir)
            .max_depth(Some(1))
            .hidden(false)
            .parents(true)
            .require_git(false)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .build();

        let mut entries = Vec::new();
        for entry in walker.flatten() {
            if entry.depth() == 0 {
                continue;
            }
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = normalize_path(&rel.to_string_lossy());
            if file_type.is_dir() {
                entries.push(DirEntry::dir(rel));
            } else if file_type.is_file() {
                entries.push(DirEntry::file(rel));
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    fn list_tree_directory(&self, path: &str, reference: &str) -> Result<Vec<DirEntry>, RemoteError> {
        let repo = self.repo()?;
        let root_tree = self.head_tree(&repo, reference)?;
        let tree = if path.is_empty() {
            root_tree
        } else {
            let entry = root_tree.get_path(Path::new(path))?;
            entry.to_object(&repo)?.peel_to_tree()?
        };

        let mut entries = Vec::new();
        for entry in tree.iter() {
            let Some(name) = entry.name() else {
                continue;
            };
            let rel = if path.is_empty() { name.to_string() } else { format!("{path}/{name}") };
            match entry.kind() {
                Some(ObjectType::Tree) => entries.push(DirEntry::dir(rel)),
                Some(ObjectType::Blob) => entries.push(DirEntry::file(rel)),
                _ => {}
            }
        }
        Ok(entries)
    }
}

fn delta_status(delta: Delta) -> FileStatus {
    match delta {
        Delta::Added | Delta::Untracked => FileStatus::Added,
        Delta::Modified | Delta::Typechange => FileStatus::Modified,
        Delta::Deleted => FileStatus::Removed,
        Delta::Renamed => FileStatus::Renamed,
        _ => FileStatus::Other,
    }
}

#[async_trait]
impl DiffSource for LocalRepository {
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, RemoteError> {
        if let Some(files) = &self.explicit_changes {
            return Ok(files
                .iter()
                .map(|f| {
                    let status =
                        if self.root.join(f).exists() { FileStatus::Modified } else { FileStatus::Removed };
                    ChangedFile::new(f.clone(), status)
                })
                .collect());
        }

        let repo = self.repo()?;
        let diff = self.diff(&repo, None)?;
        let mut changed = Vec::new();
        for delta in diff.deltas() {
            let file = if delta.status() == Delta::Deleted { delta.old_file() } else { delta.new_file() };
            let Some(path) = file.path() else {
                continue;
            };
            changed.push(ChangedFile::new(normalize_path(&path.to_string_lossy()), delta_status(delta.status())));
        }
        Ok(changed)
    }
}

#[async_trait]
impl ContentStore for LocalRepository {
    async fn file_content(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<String>, RemoteError> {
        if let Some(rev) = reference.or(self.head.as_deref()) {
            let repo = self.repo()?;
            let object = match repo.revparse_single(&format!("{rev}:{path}")) {
                Ok(object) => object,
                Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let blob = object.peel_to_blob()?;
            return Ok(decode_bytes(blob.content()));
        }

        match tokio::fs::read(self.root.join(path)).await {
            Ok(bytes) => Ok(decode_bytes(&bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RemoteError::io(path, e)),
        }
    }

    async fn file_diff(&self, path: &str) -> Result<String, RemoteError> {
        let repo = match self.repo() {
            Ok(repo) => repo,
            // an explicit file list over a plain directory has no patches
            Err(_) if self.explicit_changes.is_some() => return Ok(String::new()),
            Err(e) => return Err(e),
        };
        let diff = self.diff(&repo, Some(path))?;
        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(patch)
    }
}

#[async_trait]
impl DirectoryLister for LocalRepository {
    async fn list_directory(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Vec<DirEntry>, RemoteError> {
        match reference.or(self.head.as_deref()) {
            Some(rev) => self.list_tree_directory(path, rev),
            None => {
                let dir = self.root.join(path);
                if !dir.is_dir() {
                    return Err(RemoteError::Unavailable(format!("directory {}", dir.display())));
                }
                Ok(self.list_disk_directory(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_repo_root_returns_ancestor_with_git() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        fs::create_dir(root.join(".git")).expect("mkdir .git");
        let subdir = root.join("src").join("lib");
        fs::create_dir_all(&subdir).expect("mkdir subdir");

        assert_eq!(find_repo_root(&subdir), root);
    }

    #[test]
    fn find_repo_root_returns_start_when_no_git() {
        let temp = TempDir::new().expect("tmp");
        let dir = temp.path().join("myproject");
        fs::create_dir_all(&dir).expect("mkdir myproject");

        assert_eq!(find_repo_root(&dir), dir);
    }

    #[tokio::test]
    async fn lists_disk_directories_with_relative_paths() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        fs::create_dir_all(root.join("src/lib")).expect("mkdir");
        fs::write(root.join("src/a.ts"), "export {}").expect("write");

        let repo = LocalRepository::open(root).expect("open");
        let entries = repo.list_directory("src", None).await.expect("listing");
        assert_eq!(entries, vec![DirEntry::file("src/a.ts"), DirEntry::dir("src/lib")]);
    }

    #[tokio::test]
    async fn explicit_changes_mark_missing_files_removed() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("kept.ts"), "export {}").expect("write");

        let repo = LocalRepository::open(temp.path())
            .expect("open")
            .changed_files(vec!["kept.ts".to_string(), "gone.ts".to_string()]);
        let changed = repo.list_changed_files().await.expect("changes");
        assert_eq!(changed[0].status, FileStatus::Modified);
        assert_eq!(changed[1].status, FileStatus::Removed);
        assert_eq!(repo.file_diff("kept.ts").await.expect("diff"), "");
        assert_eq!(repo.file_content("gone.ts", None).await.expect("content"), None);
    }

    #[tokio::test]
    async fn explicit_changes_are_made_root_relative() {
        let temp = TempDir::new().expect("tmp");
        fs::create_dir_all(temp.path().join("src")).expect("mkdir");
        fs::write(temp.path().join("src/a.ts"), "export {}").expect("write");

        let repo = LocalRepository::open(temp.path()).expect("open");
        let absolute = repo.root().join("src/a.ts").to_string_lossy().into_owned();
        let repo = repo.changed_files(vec!["./src/a.ts".to_string(), absolute, "src\\b.ts".to_string()]);
        let changed = repo.list_changed_files().await.expect("changes");
        let paths: Vec<&str> = changed.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.ts", "src/a.ts", "src/b.ts"]);
    }

    #[tokio::test]
    async fn working_tree_diff_lists_untracked_files() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        let git = Repository::init(root).expect("init");
        fs::write(root.join("a.ts"), "export const a = 1;\n").expect("write");

        let mut index = git.index().expect("index");
        index.add_path(Path::new("a.ts")).expect("add");
        index.write().expect("write index");
        let tree_id = index.write_tree().expect("tree");
        let tree = git.find_tree(tree_id).expect("find tree");
        let sig = git2::Signature::now("dev", "dev@example.com").expect("sig");
        git.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).expect("commit");

        fs::write(root.join("a.ts"), "export const a = 2;\n").expect("modify");
        fs::write(root.join("b.ts"), "export const b = 1;\n").expect("write");

        let repo = LocalRepository::open(root).expect("open");
        let changed = repo.list_changed_files().await.expect("changes");
        let paths: Vec<&str> = changed.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a.ts", "b.ts"]);
        assert_eq!(changed[1].status, FileStatus::Added);

        let patch = repo.file_diff("a.ts").await.expect("diff");
        assert!(patch.contains("-export const a = 1;"));
        assert!(patch.contains("+export const a = 2;"));
    }
}
