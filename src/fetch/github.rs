//! GitHub REST API collaborator

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{ContentStore, DiffSource, DirEntry, DirectoryLister};
use crate::domain::{ChangedFile, FileStatus};
use crate::errors::RemoteError;
use crate::utils::decode_bytes;

const PER_PAGE: usize = 100;
// GitHub stops listing pull request files after 3000 entries.
const MAX_PAGES: usize = 30;

#[derive(Debug, Deserialize)]
struct PullRequest {
    head: PullHead,
}

#[derive(Debug, Deserialize)]
struct PullHead {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PullFile {
    filename: String,
    status: String,
    #[serde(default)]
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Client bound to one pull request of one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    pull_number: u64,
    head_sha: String,
    pull_files: OnceCell<Vec<PullFile>>,
}

impl GitHubClient {
    /// Connect to a pull request and resolve its head commit.
    pub async fn for_pull_request(
        api_base: &str,
        slug: &str,
        pull_number: u64,
        token: Option<&str>,
    ) -> Result<Self, RemoteError> {
        let (owner, repo) = parse_repo_slug(slug)
            .ok_or_else(|| RemoteError::decode("repository slug", format!("'{slug}' is not OWNER/NAME")))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(concat!("testscout/", env!("CARGO_PKG_VERSION"))));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RemoteError::decode("authorization header", e))?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder().default_headers(headers).build()?;

        let mut client = Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner,
            repo,
            pull_number,
            head_sha: String::new(),
            pull_files: OnceCell::new(),
        };

        let url = client.repo_url(&format!("pulls/{pull_number}"))?;
        let pull: PullRequest = client.get_json(url).await?;
        client.head_sha = pull.head.sha;
        tracing::info!(
            "Connected to {}/{}#{} at {}",
            client.owner,
            client.repo,
            client.pull_number,
            client.head_sha
        );
        Ok(client)
    }

    pub fn head_sha(&self) -> &str {
        &self.head_sha
    }

    fn repo_url(&self, tail: &str) -> Result<Url, RemoteError> {
        let raw = format!("{}/repos/{}/{}/{}", self.api_base, self.owner, self.repo, tail);
        Url::parse(&raw).map_err(|e| RemoteError::decode(raw, e))
    }

    fn contents_url(&self, path: &str, reference: &str) -> Result<Url, RemoteError> {
        let mut url = self.repo_url("contents")?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::decode("contents url", "base URL cannot hold a path"))?
            .extend(path.split('/').filter(|s| !s.is_empty()));
        url.query_pairs_mut().append_pair("ref", reference);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status { url: url.to_string(), status: status.as_u16() });
        }
        response.json::<T>().await.map_err(|e| RemoteError::decode(url.to_string(), e))
    }

    /// All files of the pull request, fetched once and cached.
    async fn pull_files(&self) -> Result<&Vec<PullFile>, RemoteError> {
        self.pull_files
            .get_or_try_init(|| async {
                let mut files = Vec::new();
                for page in 1..=MAX_PAGES {
                    let mut url = self.repo_url(&format!("pulls/{}/files", self.pull_number))?;
                    url.query_pairs_mut()
                        .append_pair("per_page", &PER_PAGE.to_string())
                        .append_pair("page", &page.to_string());
                    let batch: Vec<PullFile> = self.get_json(url).await?;
                    let done = batch.len() < PER_PAGE;
                    files.extend(batch);
                    if done {
                        break;
                    }
                }
                tracing::debug!("Pull request lists {} changed files", files.len());
                Ok::<_, RemoteError>(files)
            })
            .await
    }
}

#[async_trait]
impl DiffSource for GitHubClient {
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>, RemoteError> {
        let files = self.pull_files().await?;
        Ok(files
            .iter()
            .map(|f| ChangedFile::new(f.filename.clone(), FileStatus::from_github(&f.status)))
            .collect())
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn file_content(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Option<String>, RemoteError> {
        let url = self.contents_url(path, reference.unwrap_or(&self.head_sha))?;
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let file: ContentFile =
            response.json().await.map_err(|e| RemoteError::decode(path.to_string(), e))?;
        match (file.content, file.encoding.as_deref()) {
            (Some(content), Some("base64")) => {
                let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = STANDARD.decode(cleaned).map_err(|e| RemoteError::decode(path.to_string(), e))?;
                Ok(decode_bytes(&bytes))
            }
            // Files above the API size limit come back with encoding "none"
            _ => Ok(None),
        }
    }

    async fn file_diff(&self, path: &str) -> Result<String, RemoteError> {
        let files = self.pull_files().await?;
        Ok(files
            .iter()
            .find(|f| f.filename == path)
            .and_then(|f| f.patch.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DirectoryLister for GitHubClient {
    async fn list_directory(
        &self,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Vec<DirEntry>, RemoteError> {
        let url = self.contents_url(path, reference.unwrap_or(&self.head_sha))?;
        let entries: Vec<ContentEntry> = self.get_json(url).await?;
        Ok(entries
            .into_iter()
            .filter_map(|e| match e.kind.as_str() {
                "file" => Some(DirEntry::file(e.path)),
                "dir" => Some(DirEntry::dir(e.path)),
                // symlinks and submodules are not followed
                _ => None,
            })
            .collect())
    }
}

/// Parse `OWNER/NAME` or a GitHub URL into its owner and repository name.
///
/// Examples:
/// - `octo/widgets`                          → `("octo", "widgets")`
/// - `https://github.com/octo/widgets.git`   → `("octo", "widgets")`
/// - `git@github.com:octo/widgets.git`       → `("octo", "widgets")`
pub fn parse_repo_slug(input: &str) -> Option<(String, String)> {
    let trimmed = input.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let tail = if let Some(idx) = trimmed.find("github.com") {
        trimmed[idx + "github.com".len()..].trim_start_matches(|c: char| c == ':' || c == '/')
    } else {
        trimmed
    };

    let mut parts = tail.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
