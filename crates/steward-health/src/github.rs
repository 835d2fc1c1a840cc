use std::collections::VecDeque;
use std::future::Future;

use async_trait::async_trait;
use serde::Deserialize;
use steward_core::{EntryKind, GitHubConfig, PullRequest, RepoFile, StewardError};
use tracing::{debug, info, warn};

use crate::source::ReportSource;

/// GitHub repository client used as the [`ReportSource`].
///
/// JSON endpoints go through `octocrab`; raw file downloads use a plain
/// `reqwest` client with the same token.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

impl ContentEntry {
    fn into_repo_file(self) -> Option<RepoFile> {
        let kind = match self.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            // symlinks and submodules carry no report text
            _ => return None,
        };
        Some(RepoFile {
            name: self.name,
            path: self.path,
            kind,
            download_url: self.download_url,
            patch: None,
        })
    }
}

#[derive(Deserialize)]
struct PullRequestFile {
    filename: String,
    raw_url: Option<String>,
    patch: Option<String>,
}

impl From<PullRequestFile> for RepoFile {
    fn from(file: PullRequestFile) -> Self {
        let mut repo_file = RepoFile::file(&file.filename, file.raw_url);
        repo_file.patch = file.patch;
        repo_file
    }
}

impl GitHubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::Config`] if no token is available or the
    /// repository is not configured, or [`StewardError::GitHub`] if the
    /// client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steward_core::GitHubConfig;
    /// use steward_health::github::GitHubClient;
    ///
    /// let config = GitHubConfig {
    ///     owner: "hyperledger".into(),
    ///     repo: "toc".into(),
    ///     ..GitHubConfig::default()
    /// };
    /// let client = GitHubClient::new(Some("ghp_xxxx"), &config).unwrap();
    /// ```
    pub fn new(token: Option<&str>, config: &GitHubConfig) -> Result<Self, StewardError> {
        let (owner, repo) = config.repository()?;
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                StewardError::Config(
                    "GITHUB_TOKEN not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
                )
            })?,
        };

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| StewardError::GitHub(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::new();

        Ok(Self {
            octocrab,
            http,
            token,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn contents_route(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("/repos/{}/{}/contents", self.owner, self.repo)
        } else {
            format!("/repos/{}/{}/contents/{path}", self.owner, self.repo)
        }
    }

    /// List the direct children of one directory.
    async fn list_directory(&self, path: &str) -> Result<Vec<RepoFile>, StewardError> {
        debug!(path, "listing directory");
        let entries: Vec<ContentEntry> = self
            .octocrab
            .get(self.contents_route(path), None::<&()>)
            .await
            .map_err(|e| StewardError::GitHub(format!("failed to list '{path}': {e}")))?;
        Ok(entries
            .into_iter()
            .filter_map(ContentEntry::into_repo_file)
            .collect())
    }

    async fn download(&self, url: &str) -> Result<String, StewardError> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "steward")
            .send()
            .await
            .map_err(|e| StewardError::GitHub(format!("failed to download {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StewardError::GitHub(format!(
                "GitHub download error {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| StewardError::GitHub(format!("failed to read {url}: {e}")))
    }
}

#[async_trait]
impl ReportSource for GitHubClient {
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, StewardError> {
        let route = format!("/repos/{}/{}/pulls", self.owner, self.repo);
        let params = [("state", "open"), ("per_page", "100")];
        let prs: Vec<PullRequest> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .map_err(|e| StewardError::GitHub(format!("failed to list pull requests: {e}")))?;
        info!(count = prs.len(), "fetched open pull requests");
        Ok(prs)
    }

    async fn list_files(&self, path: &str) -> Result<Vec<RepoFile>, StewardError> {
        let files = walk_tree(path, |dir| async move { self.list_directory(&dir).await }).await?;
        info!(path, count = files.len(), "listed repository files");
        Ok(files)
    }

    async fn read_file(&self, file: &RepoFile) -> Result<String, StewardError> {
        match (&file.download_url, &file.patch) {
            (Some(url), _) => {
                debug!(name = %file.name, "downloading file");
                self.download(url).await
            }
            (None, Some(patch)) => Ok(patch.clone()),
            (None, None) => {
                warn!(name = %file.name, "no download URL for file");
                Ok(String::new())
            }
        }
    }

    async fn file_by_path(&self, path: &str) -> Result<RepoFile, StewardError> {
        let entry: ContentEntry = self
            .octocrab
            .get(self.contents_route(path), None::<&()>)
            .await
            .map_err(|e| StewardError::GitHub(format!("failed to fetch '{path}': {e}")))?;
        entry
            .into_repo_file()
            .filter(RepoFile::is_file)
            .ok_or_else(|| StewardError::GitHub(format!("'{path}' is not a regular file")))
    }

    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<RepoFile>, StewardError> {
        let route = format!("/repos/{}/{}/pulls/{number}/files", self.owner, self.repo);
        let files: Vec<PullRequestFile> = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| {
                StewardError::GitHub(format!("failed to list files of PR #{number}: {e}"))
            })?;
        info!(number, count = files.len(), "fetched pull request files");
        Ok(files.into_iter().map(RepoFile::from).collect())
    }
}

/// Flatten a directory tree into its files, depth-first, in listing order.
///
/// Uses an explicit stack of pending sibling queues instead of recursion, so
/// deep trees cost heap, not call stack. `list_dir` returns the direct
/// children of one directory path.
///
/// # Errors
///
/// Propagates the first error returned by `list_dir`.
///
/// # Examples
///
/// ```
/// use steward_core::{EntryKind, RepoFile};
/// use steward_health::github::walk_tree;
///
/// # tokio_test(async {
/// let files = walk_tree("", |dir| async move {
///     Ok(if dir.is_empty() {
///         vec![RepoFile::file("a.md", None)]
///     } else {
///         vec![]
///     })
/// })
/// .await
/// .unwrap();
/// assert_eq!(files.len(), 1);
/// # });
/// # fn tokio_test<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn walk_tree<F, Fut>(root: &str, mut list_dir: F) -> Result<Vec<RepoFile>, StewardError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<RepoFile>, StewardError>>,
{
    let mut pending: Vec<VecDeque<RepoFile>> = vec![list_dir(root.to_string()).await?.into()];
    let mut files = Vec::new();

    while let Some(level) = pending.last_mut() {
        let Some(entry) = level.pop_front() else {
            pending.pop();
            continue;
        };
        match entry.kind {
            EntryKind::File => files.push(entry),
            EntryKind::Dir => {
                let children = list_dir(entry.path).await?;
                pending.push(children.into());
            }
        }
    }

    Ok(files)
}
