use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// An open pull request as returned by the repository host.
///
/// Title and body arrive as `null` for some pull requests; both deserialize
/// to empty strings so callers never have to special-case them.
///
/// # Examples
///
/// ```
/// use steward_core::PullRequest;
///
/// let pr: PullRequest = serde_json::from_str(
///     r#"{"number": 7, "title": "firefly: Q3 update", "body": null}"#,
/// ).unwrap();
/// assert_eq!(pr.number, 7);
/// assert!(pr.body.is_empty());
/// assert!(pr.description.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title line.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Free-text body.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    /// Optional extra description field.
    #[serde(default)]
    pub description: Option<String>,
}

impl PullRequest {
    /// Title, body and description joined by spaces and lowercased.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_core::PullRequest;
    ///
    /// let pr = PullRequest {
    ///     number: 1,
    ///     title: "Besu Report".into(),
    ///     body: "Q2".into(),
    ///     description: None,
    /// };
    /// assert_eq!(pr.search_text(), "besu report q2 ");
    /// ```
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.body,
            self.description.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A normalized project identifier: trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use steward_core::ProjectId;
///
/// let id = ProjectId::new("  Hyperledger FireFly ").unwrap();
/// assert_eq!(id.as_str(), "hyperledger firefly");
/// assert!(ProjectId::new("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Normalize `raw` into an identifier; `None` when nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// The normalized identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Every project identifier known for one run.
///
/// Ordered, so that correlation visits candidates in the same order on every
/// run.
pub type CandidateProjectSet = BTreeSet<ProjectId>;

/// Whether a repository entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A file descriptor from the repository host.
///
/// Repository listings fill `download_url`; pull request file listings fill
/// `download_url` from the raw URL and may carry the diff `patch`.
///
/// # Examples
///
/// ```
/// use steward_core::{EntryKind, RepoFile};
///
/// let file = RepoFile::file("reports/besu.md", Some("https://raw/besu.md".into()));
/// assert_eq!(file.name, "besu.md");
/// assert_eq!(file.kind, EntryKind::File);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    /// Last path component.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    /// Entry type.
    pub kind: EntryKind,
    /// Where the raw content can be downloaded.
    pub download_url: Option<String>,
    /// Unified diff for the file, present on pull request files.
    pub patch: Option<String>,
}

impl RepoFile {
    /// Build a file entry, deriving `name` from the last path component.
    pub fn file(path: &str, download_url: Option<String>) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            name,
            path: path.to_string(),
            kind: EntryKind::File,
            download_url,
            patch: None,
        }
    }

    /// Whether this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Where a report's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "path")]
pub enum ReportOrigin {
    /// A file changed by the pull request.
    PullRequestFile(String),
    /// Title, body and description of the pull request.
    PullRequestText,
    /// A file already in the repository.
    RepositoryFile(String),
}

impl fmt::Display for ReportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullRequestFile(path) => write!(f, "pull request file {path}"),
            Self::PullRequestText => f.write_str("pull request text"),
            Self::RepositoryFile(path) => write!(f, "repository file {path}"),
        }
    }
}

/// A block of free-text evidence about one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Provenance of the text.
    pub origin: ReportOrigin,
    /// Report body.
    pub text: String,
}

/// One per-report analysis result.
///
/// # Examples
///
/// ```
/// use steward_core::AnalysisStep;
///
/// let step = AnalysisStep { index: 2, text: "Commits are steady.".into() };
/// assert_eq!(step.render(), "Step 2 Analysis:\nCommits are steady.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStep {
    /// 1-based position in collection order.
    pub index: usize,
    /// Model output for the report.
    pub text: String,
}

impl AnalysisStep {
    /// The form written to the result file and fed to the summary prompt.
    pub fn render(&self) -> String {
        format!("Step {} Analysis:\n{}", self.index, self.text)
    }
}

/// Output format for command results.
///
/// # Examples
///
/// ```
/// use steward_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_normalizes() {
        let id = ProjectId::new("\tBESU\n").unwrap();
        assert_eq!(id.as_str(), "besu");
        assert_eq!(id, ProjectId::new("besu").unwrap());
        assert_eq!(id.to_string(), "besu");
    }

    #[test]
    fn project_id_rejects_blank() {
        assert!(ProjectId::new("").is_none());
        assert!(ProjectId::new(" \t ").is_none());
    }

    #[test]
    fn candidate_set_iterates_in_order() {
        let set: CandidateProjectSet = ["web3j", "besu", "firefly"]
            .iter()
            .filter_map(|s| ProjectId::new(s))
            .collect();
        let order: Vec<&str> = set.iter().map(ProjectId::as_str).collect();
        assert_eq!(order, vec!["besu", "firefly", "web3j"]);
    }

    #[test]
    fn pull_request_missing_fields_default() {
        let pr: PullRequest = serde_json::from_str(r#"{"number": 3}"#).unwrap();
        assert!(pr.title.is_empty());
        assert!(pr.body.is_empty());
    }

    #[test]
    fn search_text_includes_description() {
        let pr = PullRequest {
            number: 1,
            title: "Update".into(),
            body: "".into(),
            description: Some("Hyperledger Iroha".into()),
        };
        assert!(pr.search_text().contains("hyperledger iroha"));
    }

    #[test]
    fn repo_file_name_from_path() {
        let file = RepoFile::file("a/b/2025-Besu.md", None);
        assert_eq!(file.name, "2025-Besu.md");
        let root = RepoFile::file("README.md", None);
        assert_eq!(root.name, "README.md");
    }

    #[test]
    fn report_origin_display() {
        let origin = ReportOrigin::RepositoryFile("x/besu.md".into());
        assert_eq!(origin.to_string(), "repository file x/besu.md");
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }
}
