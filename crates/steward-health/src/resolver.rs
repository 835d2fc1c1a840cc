//! Project resolution: which tracked project is a pull request about?
//!
//! Resolution first correlates the pull request text against the candidate
//! set discovered from the repository, then falls back to reading a name out
//! of the title or body, and finally to asking the model.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use steward_core::{
    CandidateProjectSet, GitHubConfig, ProjectId, PullRequest, RepoFile, ResolverConfig,
    StewardError,
};
use tracing::{debug, info, warn};

use crate::matcher::{self, MatchStrategy};
use crate::source::ReportSource;

/// Token that generic "Create <file>" titles start with.
const REJECTED_TOKEN: &str = "create";

/// Shortest file-name token kept as a fallback candidate, exclusive.
const MIN_TOKEN_LEN: usize = 2;

/// Last-resort source of a project name.
///
/// The answer is trusted as-is; resolution only normalizes it.
#[async_trait]
pub trait ProjectInference: Send + Sync {
    /// Name the project described by `title` and `body`, if possible.
    async fn infer_project(&self, title: &str, body: &str) -> Result<Option<String>, StewardError>;
}

fn title_regex() -> &'static Regex {
    static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
    TITLE_REGEX.get_or_init(|| Regex::new(r"^([\w\-]+)[\s:]+").expect("invalid title regex"))
}

fn body_regex() -> &'static Regex {
    static BODY_REGEX: OnceLock<Regex> = OnceLock::new();
    BODY_REGEX.get_or_init(|| {
        Regex::new(r"(?i)project\s*name\s*[:\-]\s*([\w\-]+(?:[ \t]+[\w\-]+)*)")
            .expect("invalid body regex")
    })
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| Regex::new(r"[\w\-]+").expect("invalid word regex"))
}

fn separator_row_regex() -> &'static Regex {
    static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
    SEPARATOR_REGEX.get_or_init(|| Regex::new(r"^\s*[-|:\s]+\s*$").expect("invalid separator regex"))
}

fn non_word_regex() -> &'static Regex {
    static NON_WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    NON_WORD_REGEX.get_or_init(|| Regex::new(r"\W+").expect("invalid non-word regex"))
}

fn accept(token: &str) -> Option<&str> {
    if token.eq_ignore_ascii_case(REJECTED_TOKEN) {
        None
    } else {
        Some(token)
    }
}

/// The leading word of a title followed by whitespace or a colon.
///
/// # Examples
///
/// ```
/// use steward_health::resolver::title_candidate;
///
/// assert_eq!(title_candidate("FireFly: Q3 update"), Some("FireFly"));
/// assert_eq!(title_candidate("Create 2025-annual-Besu.md"), None);
/// assert_eq!(title_candidate("Besu"), None);
/// ```
pub fn title_candidate(title: &str) -> Option<&str> {
    let captures = title_regex().captures(title)?;
    accept(captures.get(1)?.as_str())
}

/// The name following `project name:` anywhere in the body.
///
/// The words after the marker are matched against `candidates`: the longest
/// leading run of words that names a known project wins, otherwise only the
/// first word is taken.
///
/// # Examples
///
/// ```
/// use steward_core::{CandidateProjectSet, ProjectId};
/// use steward_health::resolver::body_candidate;
///
/// let known: CandidateProjectSet = ProjectId::new("hyperledger firefly").into_iter().collect();
/// assert_eq!(
///     body_candidate("Annual report. Project name: Hyperledger FireFly.", &known),
///     Some("Hyperledger FireFly"),
/// );
/// assert_eq!(body_candidate("PROJECT NAME - besu is growing", &known), Some("besu"));
/// assert_eq!(body_candidate("no marker here", &known), None);
/// ```
pub fn body_candidate<'a>(body: &'a str, candidates: &CandidateProjectSet) -> Option<&'a str> {
    let captured = body_regex().captures(body)?.get(1)?.as_str();
    let ends: Vec<usize> = word_regex().find_iter(captured).map(|m| m.end()).collect();
    let first = accept(&captured[..*ends.first()?])?;
    let known = ends.iter().rev().map(|&end| &captured[..end]).find(|words| {
        ProjectId::new(words).is_some_and(|id| candidates.contains(&id))
    });
    Some(known.unwrap_or(first))
}

/// Read a project name out of a pull request.
///
/// Tries the title, then the body, then `fallback`. The name is returned in
/// its original case. `candidates` bounds how many words the body rule takes;
/// see [`body_candidate`].
///
/// # Errors
///
/// Propagates errors from `fallback`.
pub async fn extract_project_name(
    pr: &PullRequest,
    candidates: &CandidateProjectSet,
    fallback: Option<&dyn ProjectInference>,
) -> Result<Option<String>, StewardError> {
    if let Some(name) = title_candidate(&pr.title) {
        info!(project = name, "extracted project name from PR title");
        return Ok(Some(name.to_string()));
    }
    if let Some(name) = body_candidate(&pr.body, candidates) {
        info!(project = name, "extracted project name from PR body");
        return Ok(Some(name.to_string()));
    }
    if let Some(inference) = fallback {
        return inference.infer_project(&pr.title, &pr.body).await;
    }
    warn!("failed to extract project name from PR using heuristics");
    Ok(None)
}

fn split_row(line: &str) -> Vec<&str> {
    line.trim().trim_matches('|').split('|').map(str::trim).collect()
}

fn is_separator_cell(cell: &str) -> bool {
    cell.chars().all(|c| c == '-' || c == ':' || c.is_whitespace())
}

/// Extract the `project` column of the first markdown table that has one.
///
/// Rows whose column count differs from the header are ignored, as are
/// separator rows and blank cells.
///
/// # Errors
///
/// Returns [`StewardError::Schedule`] if no header row has a `project` column.
///
/// # Examples
///
/// ```
/// use steward_health::resolver::parse_schedule;
///
/// let doc = "| Project | Status |\n|---|---|\n| Besu | Active |\n";
/// let projects = parse_schedule(doc).unwrap();
/// assert!(projects.iter().any(|p| p.as_str() == "besu"));
/// assert!(parse_schedule("no table").is_err());
/// ```
pub fn parse_schedule(content: &str) -> Result<CandidateProjectSet, StewardError> {
    let mut lines = content.lines();
    let mut header: Option<(usize, usize)> = None;

    for line in lines.by_ref() {
        if !line.contains('|') {
            continue;
        }
        let columns: Vec<String> = split_row(line).iter().map(|c| c.to_lowercase()).collect();
        if let Some(index) = columns.iter().position(|c| c == "project") {
            header = Some((index, columns.len()));
            break;
        }
    }

    let Some((project_column, width)) = header else {
        return Err(StewardError::Schedule(
            "no table with a 'project' column".into(),
        ));
    };

    let mut projects = CandidateProjectSet::new();
    for line in lines {
        if !line.contains('|') || separator_row_regex().is_match(line) {
            continue;
        }
        let cells = split_row(line);
        if cells.len() != width {
            debug!(row = line, "skipping schedule row with {} columns", cells.len());
            continue;
        }
        let cell = cells[project_column];
        if is_separator_cell(cell) {
            continue;
        }
        if let Some(id) = ProjectId::new(cell) {
            projects.insert(id);
        }
    }
    Ok(projects)
}

/// Every word of every file name longer than two characters, lowercased.
///
/// # Examples
///
/// ```
/// use steward_core::RepoFile;
/// use steward_health::resolver::tokenize_file_names;
///
/// let files = vec![RepoFile::file("tac/2025-annual-Besu.md", None)];
/// let tokens: Vec<String> = tokenize_file_names(&files).iter().map(|t| t.to_string()).collect();
/// assert_eq!(tokens, vec!["2025", "annual", "besu"]);
/// ```
pub fn tokenize_file_names(files: &[RepoFile]) -> CandidateProjectSet {
    files
        .iter()
        .filter(|f| f.is_file())
        .flat_map(|f| non_word_regex().split(&f.name))
        .filter(|token| token.chars().count() > MIN_TOKEN_LEN)
        .filter_map(ProjectId::new)
        .collect()
}

async fn read_schedule(
    source: &dyn ReportSource,
    schedule_path: &str,
) -> Result<CandidateProjectSet, StewardError> {
    let file = source.file_by_path(schedule_path).await?;
    let content = source.read_file(&file).await?;
    parse_schedule(&content)
}

/// Build the candidate set for this run.
///
/// Reads the schedule document; on any failure, tokenizes the name of every
/// file in the repository instead.
///
/// # Errors
///
/// Returns the source error if the fallback listing fails too.
pub async fn discover_candidate_projects(
    source: &dyn ReportSource,
    schedule_path: &str,
) -> Result<CandidateProjectSet, StewardError> {
    match read_schedule(source, schedule_path).await {
        Ok(projects) => {
            info!(count = projects.len(), "projects extracted from schedule table");
            return Ok(projects);
        }
        Err(e) => warn!(error = %e, path = schedule_path, "failed to extract projects from schedule file"),
    }

    let files = source.list_files("").await?;
    let candidates = tokenize_file_names(&files);
    info!(count = candidates.len(), "possible projects from file names");
    Ok(candidates)
}

/// Resolves pull requests to project identifiers.
pub struct ProjectResolver {
    strategy: Box<dyn MatchStrategy>,
    schedule_path: String,
}

impl ProjectResolver {
    pub fn new(strategy: Box<dyn MatchStrategy>, schedule_path: impl Into<String>) -> Self {
        Self {
            strategy,
            schedule_path: schedule_path.into(),
        }
    }

    /// Build a resolver from the `[github]` and `[resolver]` sections.
    pub fn from_config(github: &GitHubConfig, resolver: &ResolverConfig) -> Self {
        Self::new(
            matcher::strategy_for(resolver.matcher),
            github.schedule_path.clone(),
        )
    }

    /// Discover the candidate set; see [`discover_candidate_projects`].
    pub async fn discover(
        &self,
        source: &dyn ReportSource,
    ) -> Result<CandidateProjectSet, StewardError> {
        discover_candidate_projects(source, &self.schedule_path).await
    }

    /// The best candidate found in the pull request's title, body and description.
    pub fn correlate(&self, pr: &PullRequest, candidates: &CandidateProjectSet) -> Option<ProjectId> {
        let text = pr.search_text();
        let Some(best) = matcher::best_match(self.strategy.as_ref(), &text, candidates) else {
            warn!(pr = pr.number, "unable to determine project from PR text correlation");
            return None;
        };
        if !best.tied_with.is_empty() {
            let others: Vec<&str> = best.tied_with.iter().map(|p| p.as_str()).collect();
            warn!(
                pr = pr.number,
                chosen = %best.project,
                ?others,
                "ambiguous project correlation"
            );
        }
        info!(pr = pr.number, project = %best.project, "determined project from PR text correlation");
        Some(best.project.clone())
    }

    /// Correlate, then fall back to [`extract_project_name`].
    ///
    /// # Errors
    ///
    /// Propagates errors from `fallback`.
    pub async fn resolve(
        &self,
        pr: &PullRequest,
        candidates: &CandidateProjectSet,
        fallback: Option<&dyn ProjectInference>,
    ) -> Result<Option<ProjectId>, StewardError> {
        if let Some(project) = self.correlate(pr, candidates) {
            return Ok(Some(project));
        }
        let name = extract_project_name(pr, candidates, fallback).await?;
        Ok(name.as_deref().and_then(ProjectId::new))
    }
}
