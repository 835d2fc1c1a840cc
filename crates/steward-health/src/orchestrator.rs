use std::fmt;

use serde::Serialize;
use steward_core::{CandidateProjectSet, ProjectId, PullRequest, StewardError};
use tracing::{error, info, info_span, warn, Instrument};

use crate::collector;
use crate::llm::{InferenceService, LlmProjectInference};
use crate::pipeline::AnalysisPipeline;
use crate::resolver::{ProjectInference, ProjectResolver};
use crate::sink::ResultSink;
use crate::source::ReportSource;

/// What happened to one pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Outcome {
    /// The pipeline ran to completion.
    Analyzed { project: ProjectId, steps: usize },
    /// No project could be determined; nothing was collected.
    Unresolved,
    /// A project was determined but no report mentions it.
    NoReports { project: ProjectId },
    /// A collaborator failed; processing of this pull request stopped.
    Failed {
        project: Option<ProjectId>,
        error: String,
    },
}

/// Outcome of one pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestOutcome {
    pub number: u64,
    pub title: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything a run did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Size of the candidate set used for correlation.
    pub candidates: usize,
    /// One entry per open pull request, in source order.
    pub pull_requests: Vec<PullRequestOutcome>,
}

impl RunSummary {
    /// Number of pull requests whose analysis completed.
    pub fn analyzed(&self) -> usize {
        self.pull_requests
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Analyzed { .. }))
            .count()
    }

    /// Number of pull requests that hit a collaborator failure.
    pub fn failed(&self) -> usize {
        self.pull_requests
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Failed { .. }))
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project Health Run")?;
        writeln!(f, "==================")?;
        writeln!(
            f,
            "Candidates: {} | Pull requests: {} | Analyzed: {} | Failed: {}\n",
            self.candidates,
            self.pull_requests.len(),
            self.analyzed(),
            self.failed(),
        )?;

        if self.pull_requests.is_empty() {
            writeln!(f, "No open pull requests found.")?;
        }
        for pr in &self.pull_requests {
            let status = match &pr.outcome {
                Outcome::Analyzed { project, steps } => {
                    format!("analyzed '{project}' ({steps} reports)")
                }
                Outcome::Unresolved => "skipped: project unknown".to_string(),
                Outcome::NoReports { project } => format!("skipped: no reports for '{project}'"),
                Outcome::Failed { project: Some(project), error } => {
                    format!("failed for '{project}': {error}")
                }
                Outcome::Failed {
                    project: None,
                    error,
                } => format!("failed: {error}"),
            };
            writeln!(f, "#{} {}\n  {status}", pr.number, pr.title)?;
        }
        Ok(())
    }
}

/// Runs resolution, collection and analysis for every open pull request.
///
/// Pull requests are processed one at a time; a failure in one never stops
/// the others.
pub struct Orchestrator<'a> {
    source: &'a dyn ReportSource,
    llm: &'a dyn InferenceService,
    sink: &'a dyn ResultSink,
    resolver: ProjectResolver,
    infer_with_llm: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        source: &'a dyn ReportSource,
        llm: &'a dyn InferenceService,
        sink: &'a dyn ResultSink,
        resolver: ProjectResolver,
    ) -> Self {
        Self {
            source,
            llm,
            sink,
            resolver,
            infer_with_llm: true,
        }
    }

    /// Whether to ask the model for a project name as a last resort.
    pub fn infer_with_llm(mut self, enabled: bool) -> Self {
        self.infer_with_llm = enabled;
        self
    }

    /// Process every open pull request.
    ///
    /// # Errors
    ///
    /// Returns an error only if the candidate set or the pull request list
    /// cannot be fetched. Per pull request failures are reported in the
    /// summary.
    pub async fn run(&self) -> Result<RunSummary, StewardError> {
        let candidates = self.resolver.discover(self.source).await?;
        let pull_requests = self.source.list_open_pull_requests().await?;
        let mut summary = RunSummary {
            candidates: candidates.len(),
            pull_requests: Vec::with_capacity(pull_requests.len()),
        };

        if pull_requests.is_empty() {
            info!("no open pull requests found");
            return Ok(summary);
        }

        for pr in &pull_requests {
            let span = info_span!("pull_request", number = pr.number);
            let outcome = self.process(pr, &candidates).instrument(span).await;
            summary.pull_requests.push(PullRequestOutcome {
                number: pr.number,
                title: pr.title.clone(),
                outcome,
            });
        }
        Ok(summary)
    }

    /// Resolve, collect and analyze a single pull request.
    pub async fn process(&self, pr: &PullRequest, candidates: &CandidateProjectSet) -> Outcome {
        let inference = LlmProjectInference::new(self.llm);
        let fallback: Option<&dyn ProjectInference> = if self.infer_with_llm {
            Some(&inference)
        } else {
            None
        };

        let project = match self.resolver.resolve(pr, candidates, fallback).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                warn!("skipping PR; unable to determine project");
                return Outcome::Unresolved;
            }
            Err(e) => return failed(None, e),
        };

        let reports = match collector::collect(pr, self.source, &project).await {
            Ok(reports) if reports.is_empty() => {
                warn!(%project, "no reports found for project");
                return Outcome::NoReports { project };
            }
            Ok(reports) => reports,
            Err(e) => return failed(Some(project), e),
        };

        let pipeline = AnalysisPipeline::new(self.llm, self.sink);
        match pipeline.run(&project, &reports).await {
            Ok(analysis) => Outcome::Analyzed {
                project,
                steps: analysis.steps.len(),
            },
            Err(e) => failed(Some(project), e),
        }
    }
}

fn failed(project: Option<ProjectId>, e: StewardError) -> Outcome {
    error!(error = %e, "pull request processing failed");
    Outcome::Failed {
        project,
        error: e.to_string(),
    }
}
