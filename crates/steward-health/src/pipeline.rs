use std::fmt;

use steward_core::{AnalysisStep, ProjectId, Report, StewardError};
use tracing::{debug, info, warn};

use crate::llm::{GenerationOptions, InferenceService};
use crate::prompt;
use crate::sink::ResultSink;

/// Where a project's analysis currently stands.
///
/// # Examples
///
/// ```
/// use steward_health::pipeline::Stage;
///
/// assert_eq!(Stage::PerReportAnalyzed(2).to_string(), "per-report analyzed (2)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reports gathered, nothing analyzed yet.
    Collected,
    /// The first `n` reports have been analyzed and persisted.
    PerReportAnalyzed(usize),
    /// The summary has been generated.
    Aggregated,
    /// The summary has been persisted.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collected => f.write_str("collected"),
            Self::PerReportAnalyzed(n) => write!(f, "per-report analyzed ({n})"),
            Self::Aggregated => f.write_str("aggregated"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Result of a completed analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Project the analysis belongs to.
    pub project: ProjectId,
    /// One step per report, in collection order.
    pub steps: Vec<AnalysisStep>,
    /// Final evaluation.
    pub summary: String,
}

impl Analysis {
    /// The text of the final persisted result.
    pub fn final_content(&self) -> String {
        final_content(&self.summary)
    }
}

fn final_content(summary: &str) -> String {
    format!("Final Summary:\n{summary}")
}

/// Two-stage analysis: one inference call per report, then one summary call.
///
/// After every per-report step the sink receives all steps so far, so a
/// failure on report `k` leaves steps `1..k` persisted. The summary then
/// replaces the step log. Failures are returned as-is, never retried.
pub struct AnalysisPipeline<'a> {
    llm: &'a dyn InferenceService,
    sink: &'a dyn ResultSink,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(llm: &'a dyn InferenceService, sink: &'a dyn ResultSink) -> Self {
        Self { llm, sink }
    }

    /// Analyze `reports` for `project` and persist progress along the way.
    ///
    /// # Errors
    ///
    /// Returns the first inference or sink failure.
    pub async fn run(&self, project: &ProjectId, reports: &[Report]) -> Result<Analysis, StewardError> {
        let mut stage = Stage::Collected;
        let result = self.advance(project, reports, &mut stage).await;
        if let Err(e) = &result {
            warn!(%project, %stage, error = %e, "analysis stopped");
        }
        result
    }

    async fn advance(
        &self,
        project: &ProjectId,
        reports: &[Report],
        stage: &mut Stage,
    ) -> Result<Analysis, StewardError> {
        let step_options = GenerationOptions::short(prompt::STEP_MAX_TOKENS);
        let mut steps: Vec<AnalysisStep> = Vec::with_capacity(reports.len());

        for (offset, report) in reports.iter().enumerate() {
            let index = offset + 1;
            let prompt = prompt::build_report_prompt(&report.text, index);
            debug!(index, origin = %report.origin, prompt_chars = prompt.len(), "analyzing report");

            let text = self.llm.generate(&prompt, &step_options).await?;
            info!(%project, index, "received analysis for report");
            steps.push(AnalysisStep { index, text });

            self.sink.write(project, &prompt::render_steps(&steps))?;
            *stage = Stage::PerReportAnalyzed(index);
        }

        let summary_prompt = prompt::build_summary_prompt(&steps);
        let summary = self
            .llm
            .generate(
                &summary_prompt,
                &GenerationOptions::short(prompt::SUMMARY_MAX_TOKENS),
            )
            .await?;
        *stage = Stage::Aggregated;

        self.sink.write(project, &final_content(&summary))?;
        *stage = Stage::Done;
        info!(%project, steps = steps.len(), "final results processed");

        Ok(Analysis {
            project: project.clone(),
            steps,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, ScriptedLlm};
    use steward_core::ReportOrigin;

    fn reports(texts: &[&str]) -> Vec<Report> {
        texts
            .iter()
            .map(|t| Report {
                origin: ReportOrigin::PullRequestText,
                text: t.to_string(),
            })
            .collect()
    }

    fn besu() -> ProjectId {
        ProjectId::new("besu").unwrap()
    }

    #[tokio::test]
    async fn persists_after_every_step_then_summary() {
        let llm = ScriptedLlm::new(vec!["steady commits", "two risks", "healthy overall"]);
        let sink = RecordingSink::default();
        let pipeline = AnalysisPipeline::new(&llm, &sink);

        let analysis = pipeline
            .run(&besu(), &reports(&["report one", "report two"]))
            .await
            .unwrap();

        assert_eq!(
            sink.writes(),
            vec![
                "besu:\n\nStep 1 Analysis:\nsteady commits\n".to_string(),
                "besu:\n\nStep 1 Analysis:\nsteady commits\n\nStep 2 Analysis:\ntwo risks\n"
                    .to_string(),
                "besu:\n\nFinal Summary:\nhealthy overall\n".to_string(),
            ]
        );
        assert_eq!(analysis.steps.len(), 2);
        assert_eq!(analysis.summary, "healthy overall");
        assert_eq!(analysis.final_content(), "Final Summary:\nhealthy overall");
    }

    #[tokio::test]
    async fn prompts_embed_reports_and_steps() {
        let llm = ScriptedLlm::new(vec!["a1", "a2", "sum"]);
        let sink = RecordingSink::default();
        AnalysisPipeline::new(&llm, &sink)
            .run(&besu(), &reports(&["first body", "second body"]))
            .await
            .unwrap();

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("(file 1)") && prompts[0].contains("first body"));
        assert!(prompts[1].contains("(file 2)") && prompts[1].contains("second body"));
        assert!(prompts[2].contains("Step 1 Analysis:\na1\n\nStep 2 Analysis:\na2"));
    }

    #[tokio::test]
    async fn generation_options_are_fixed() {
        let llm = ScriptedLlm::new(vec!["a1", "sum"]);
        let sink = RecordingSink::default();
        AnalysisPipeline::new(&llm, &sink)
            .run(&besu(), &reports(&["only"]))
            .await
            .unwrap();

        let options = llm.options();
        assert_eq!(options[0], GenerationOptions::short(150));
        assert_eq!(options[1], GenerationOptions::short(250));
    }

    #[tokio::test]
    async fn failure_keeps_earlier_steps_persisted() {
        let llm = ScriptedLlm::new(vec!["a1", "a2"]).then_fail("503 Service Unavailable");
        let sink = RecordingSink::default();
        let err = AnalysisPipeline::new(&llm, &sink)
            .run(&besu(), &reports(&["r1", "r2", "r3"]))
            .await
            .unwrap_err();

        assert!(matches!(err, StewardError::Llm(_)));
        assert_eq!(llm.prompts().len(), 3);
        assert_eq!(
            sink.last().unwrap(),
            "besu:\n\nStep 1 Analysis:\na1\n\nStep 2 Analysis:\na2\n"
        );
    }

    #[tokio::test]
    async fn summary_failure_leaves_full_step_log() {
        let llm = ScriptedLlm::new(vec!["a1"]).then_fail("timeout");
        let sink = RecordingSink::default();
        let result = AnalysisPipeline::new(&llm, &sink)
            .run(&besu(), &reports(&["r1"]))
            .await;
        assert!(result.is_err());
        assert_eq!(sink.writes().len(), 1);
        assert!(sink.last().unwrap().contains("Step 1 Analysis:\na1"));
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_output() {
        let mut outputs = Vec::new();
        for _ in 0..2 {
            let llm = ScriptedLlm::new(vec!["x", "y", "z"]);
            let sink = RecordingSink::default();
            AnalysisPipeline::new(&llm, &sink)
                .run(&besu(), &reports(&["r1", "r2"]))
                .await
                .unwrap();
            outputs.push(sink.writes());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Collected.to_string(), "collected");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
