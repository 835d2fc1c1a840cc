use async_trait::async_trait;
use steward_core::{PullRequest, RepoFile, StewardError};

/// Read access to the repository that holds project reports.
///
/// Every call is made once; implementations must not retry. Failures are
/// reported as [`StewardError::GitHub`] (or another transport variant) and
/// abort only the pull request being processed.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Open pull requests, in the order the host returns them.
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, StewardError>;

    /// Every file below `path` (empty for the root), flattened.
    ///
    /// Directories are traversed but never returned.
    async fn list_files(&self, path: &str) -> Result<Vec<RepoFile>, StewardError>;

    /// Raw text of a file; empty when the descriptor has nothing to fetch.
    async fn read_file(&self, file: &RepoFile) -> Result<String, StewardError>;

    /// Descriptor of a single file addressed by path.
    async fn file_by_path(&self, path: &str) -> Result<RepoFile, StewardError>;

    /// Files changed by pull request `number`.
    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<RepoFile>, StewardError>;
}
