use steward_core::AnalysisStep;

/// Token cap for one per-report analysis.
pub const STEP_MAX_TOKENS: u32 = 150;

/// Token cap for the final summary.
pub const SUMMARY_MAX_TOKENS: u32 = 250;

/// Token cap when asking the model to name a project.
pub const PROJECT_NAME_MAX_TOKENS: u32 = 20;

/// Build the prompt that analyzes a single report.
///
/// # Examples
///
/// ```
/// use steward_health::prompt::build_report_prompt;
///
/// let prompt = build_report_prompt("Contributors grew by 12%.", 3);
/// assert!(prompt.contains("(file 3)"));
/// assert!(prompt.contains("Contributors grew by 12%."));
/// ```
pub fn build_report_prompt(report: &str, index: usize) -> String {
    format!(
        "Analyze the following report (file {index}) and provide your thinking process step by step. \
         Make sure to retain all important attributes (e.g. maintenance, trends, risks, contributor details) \
         from the report. Report:\n\n\
         {report}\n\n\
         Your detailed analysis (chain-of-thought):"
    )
}

/// Build the prompt that turns every step into one evaluation.
///
/// # Examples
///
/// ```
/// use steward_core::AnalysisStep;
/// use steward_health::prompt::build_summary_prompt;
///
/// let steps = vec![
///     AnalysisStep { index: 1, text: "Healthy.".into() },
///     AnalysisStep { index: 2, text: "One maintainer left.".into() },
/// ];
/// let prompt = build_summary_prompt(&steps);
/// assert!(prompt.contains("Step 1 Analysis:\nHealthy.\n\nStep 2 Analysis:"));
/// assert!(prompt.ends_with("Final Summary:"));
/// ```
pub fn build_summary_prompt(steps: &[AnalysisStep]) -> String {
    format!(
        "Based on the following individual analysis steps, produce a comprehensive evaluation summary \
         with your detailed chain-of-thought. Retain all crucial attributes and include your reasoning process:\n\n\
         {}\n\nFinal Summary:",
        render_steps(steps)
    )
}

/// Every step in order, separated by a blank line.
pub fn render_steps(steps: &[AnalysisStep]) -> String {
    steps
        .iter()
        .map(AnalysisStep::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the prompt asking which project a pull request is about.
pub fn build_project_name_prompt(title: &str, body: &str) -> String {
    format!(
        "A pull request updates the health report of one open source project. \
         Reply with only the project name, or \"unknown\" if it cannot be determined.\n\n\
         Title: {title}\n\
         Body:\n{body}\n\n\
         Project name:"
    )
}

/// Normalize a model's answer to the project name prompt.
///
/// Strips surrounding whitespace, quotes and a trailing period. Returns
/// `None` for an empty answer or `unknown`.
///
/// # Examples
///
/// ```
/// use steward_health::prompt::clean_project_name_answer;
///
/// assert_eq!(clean_project_name_answer(" \"Hyperledger Aries\". ").as_deref(), Some("Hyperledger Aries"));
/// assert_eq!(clean_project_name_answer("UNKNOWN"), None);
/// assert_eq!(clean_project_name_answer("   "), None);
/// ```
pub fn clean_project_name_answer(answer: &str) -> Option<String> {
    let cleaned = answer
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("unknown") {
        None
    } else {
        Some(cleaned.to_string())
    }
}
