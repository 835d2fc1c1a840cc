//! Report collection for a resolved project.
//!
//! Reports come from two places: the pull request itself (its changed files,
//! or failing that its text) and the repository (files whose name and content
//! both mention the project). Pull request reports always come first.

use steward_core::{ProjectId, PullRequest, RepoFile, Report, ReportOrigin, StewardError};
use tracing::{info, warn};

use crate::source::ReportSource;

/// Keep files whose name contains `project`, ignoring case.
///
/// # Examples
///
/// ```
/// use steward_core::{ProjectId, RepoFile};
/// use steward_health::collector::filter_repo_files;
///
/// let files = vec![
///     RepoFile::file("2025-Besu.md", None),
///     RepoFile::file("2025-Iroha.md", None),
/// ];
/// let besu = ProjectId::new("besu").unwrap();
/// let kept = filter_repo_files(&files, &besu);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].name, "2025-Besu.md");
/// ```
pub fn filter_repo_files<'a>(files: &'a [RepoFile], project: &ProjectId) -> Vec<&'a RepoFile> {
    let needle = project.as_str();
    let filtered: Vec<&RepoFile> = files
        .iter()
        .filter(|f| f.is_file() && f.name.to_lowercase().contains(needle))
        .collect();
    info!(count = filtered.len(), %project, "filtered files matching project");
    filtered
}

/// Repository files whose name and content both mention `project`.
///
/// # Errors
///
/// Propagates listing and download failures.
pub async fn collect_from_repository(
    source: &dyn ReportSource,
    project: &ProjectId,
) -> Result<Vec<Report>, StewardError> {
    let files = source.list_files("").await?;
    let mut reports = Vec::new();
    for file in filter_repo_files(&files, project) {
        let content = source.read_file(file).await?;
        if content.to_lowercase().contains(project.as_str()) {
            info!(file = %file.path, "added report from repository file");
            reports.push(Report {
                origin: ReportOrigin::RepositoryFile(file.path.clone()),
                text: content,
            });
        }
    }
    Ok(reports)
}

/// Title, body and description as one text, or `None` when all are blank.
///
/// # Examples
///
/// ```
/// use steward_core::PullRequest;
/// use steward_health::collector::pull_request_text;
///
/// let pr = PullRequest {
///     number: 4,
///     title: "Besu Q3".into(),
///     body: "".into(),
///     description: Some("Numbers inside".into()),
/// };
/// assert_eq!(pull_request_text(&pr).as_deref(), Some("Besu Q3\nNumbers inside"));
/// ```
pub fn pull_request_text(pr: &PullRequest) -> Option<String> {
    let parts: Vec<&str> = [
        pr.title.as_str(),
        pr.body.as_str(),
        pr.description.as_deref().unwrap_or_default(),
    ]
    .into_iter()
    .map(str::trim)
    .filter(|p| !p.is_empty())
    .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Reports carried by the pull request itself.
///
/// Non-empty changed files win; otherwise the pull request text becomes a
/// single report; otherwise there is nothing.
///
/// # Errors
///
/// Propagates listing and download failures.
pub async fn collect_from_pull_request(
    pr: &PullRequest,
    source: &dyn ReportSource,
) -> Result<Vec<Report>, StewardError> {
    let mut reports = Vec::new();
    for file in source.list_pull_request_files(pr.number).await? {
        let content = source.read_file(&file).await?;
        if content.is_empty() {
            continue;
        }
        reports.push(Report {
            origin: ReportOrigin::PullRequestFile(file.path),
            text: content,
        });
    }
    if !reports.is_empty() {
        info!(pr = pr.number, count = reports.len(), "extracted reports from PR files");
        return Ok(reports);
    }

    match pull_request_text(pr) {
        Some(text) => {
            info!(pr = pr.number, "extracted report from PR text");
            Ok(vec![Report {
                origin: ReportOrigin::PullRequestText,
                text,
            }])
        }
        None => {
            warn!(pr = pr.number, "no report found in PR content");
            Ok(Vec::new())
        }
    }
}

/// Every report for `project`: pull request reports, then repository reports.
///
/// # Errors
///
/// Propagates source failures from either collection.
pub async fn collect(
    pr: &PullRequest,
    source: &dyn ReportSource,
    project: &ProjectId,
) -> Result<Vec<Report>, StewardError> {
    let mut reports = collect_from_pull_request(pr, source).await?;
    reports.extend(collect_from_repository(source, project).await?);
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use steward_core::EntryKind;

    fn besu() -> ProjectId {
        ProjectId::new("besu").unwrap()
    }

    fn pr(number: u64, title: &str, body: &str) -> PullRequest {
        PullRequest {
            number,
            title: title.into(),
            body: body.into(),
            description: None,
        }
    }

    #[test]
    fn filter_is_case_insensitive_and_skips_dirs() {
        let mut dir = RepoFile::file("besu", None);
        dir.kind = EntryKind::Dir;
        let files = vec![
            RepoFile::file("tac/2025-BESU-annual.md", None),
            RepoFile::file("tac/iroha.md", None),
            dir,
        ];
        let kept = filter_repo_files(&files, &besu());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].path, "tac/2025-BESU-annual.md");
    }

    #[tokio::test]
    async fn repository_requires_name_and_content_match() {
        let source = FakeSource::new()
            .with_file("reports/besu-q1.md", "Hyperledger Besu had 40 contributors")
            .with_file("reports/besu-template.md", "Fill in the project name")
            .with_file("reports/iroha.md", "besu is mentioned but the name differs");
        let reports = collect_from_repository(&source, &besu()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].origin,
            ReportOrigin::RepositoryFile("reports/besu-q1.md".into())
        );
    }

    #[tokio::test]
    async fn pull_request_files_preferred_over_text() {
        let source = FakeSource::new()
            .with_pr_file(9, "tac/2025-Besu.md", "Besu annual numbers")
            .with_pr_file(9, "tac/empty.md", "");
        let reports = collect_from_pull_request(&pr(9, "Create 2025-Besu.md", "body"), &source)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].text, "Besu annual numbers");
        assert_eq!(
            reports[0].origin,
            ReportOrigin::PullRequestFile("tac/2025-Besu.md".into())
        );
    }

    #[tokio::test]
    async fn empty_pull_request_files_fall_back_to_text() {
        let source = FakeSource::new().with_pr_file(3, "tac/2025-Besu.md", "");
        let reports = collect_from_pull_request(&pr(3, "Besu update", "Project name: Besu"), &source)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].origin, ReportOrigin::PullRequestText);
        assert_eq!(reports[0].text, "Besu update\nProject name: Besu");
    }

    #[tokio::test]
    async fn patch_only_file_becomes_a_report() {
        let source = FakeSource::new().with_pr_patch(11, "tac/2025-Besu.md", Some("+Besu numbers"));
        let reports = collect_from_pull_request(&pr(11, "Besu update", "body"), &source)
            .await
            .unwrap();
        assert_eq!(
            reports,
            vec![Report {
                origin: ReportOrigin::PullRequestFile("tac/2025-Besu.md".into()),
                text: "+Besu numbers".into(),
            }]
        );
    }

    #[tokio::test]
    async fn file_without_url_or_patch_falls_back_to_text() {
        let source = FakeSource::new().with_pr_patch(12, "tac/2025-Besu.md", None);
        let reports = collect_from_pull_request(&pr(12, "Besu update", "Project name: Besu"), &source)
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].origin, ReportOrigin::PullRequestText);
        assert_eq!(reports[0].text, "Besu update\nProject name: Besu");
    }

    #[tokio::test]
    async fn blank_pull_request_yields_nothing() {
        let source = FakeSource::new();
        let reports = collect_from_pull_request(&pr(5, " ", ""), &source)
            .await
            .unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn pull_request_reports_come_first() {
        let source = FakeSource::new()
            .with_pr_file(2, "tac/besu-2025.md", "Besu PR report")
            .with_file("tac/besu-2024.md", "Besu last year");
        let reports = collect(&pr(2, "t", "b"), &source, &besu()).await.unwrap();
        let texts: Vec<&str> = reports.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Besu PR report", "Besu last year"]);
    }

    #[tokio::test]
    async fn download_failure_propagates() {
        let source = FakeSource::new()
            .with_file("tac/besu.md", "Besu")
            .with_failing_read("tac/besu.md");
        let err = collect_from_repository(&source, &besu()).await.unwrap_err();
        assert!(err.is_transport());
    }
}
