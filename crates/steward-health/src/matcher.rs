//! Ranking of candidate projects against pull request text.
//!
//! Correlation asks every strategy for a score per candidate and keeps the
//! highest. A score of zero or less means "no match".

use steward_core::{MatcherKind, ProjectId};

/// Scores how well a candidate project matches a lowercase text blob.
pub trait MatchStrategy: Send + Sync {
    /// Score for `candidate` within `text`; `<= 0.0` means no match.
    fn score(&self, text: &str, candidate: &ProjectId) -> f64;
}

/// 1.0 when the candidate occurs in the text, 0.0 otherwise.
///
/// With every hit scoring the same, the first candidate in iteration order
/// wins.
///
/// # Examples
///
/// ```
/// use steward_core::ProjectId;
/// use steward_health::matcher::{MatchStrategy, SubstringMatch};
///
/// let besu = ProjectId::new("besu").unwrap();
/// assert_eq!(SubstringMatch.score("besu annual report", &besu), 1.0);
/// assert_eq!(SubstringMatch.score("iroha annual report", &besu), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl MatchStrategy for SubstringMatch {
    fn score(&self, text: &str, candidate: &ProjectId) -> f64 {
        if text.contains(candidate.as_str()) {
            1.0
        } else {
            0.0
        }
    }
}

/// Prefers the longest candidate that occurs in the text.
///
/// `hyperledger firefly` beats `firefly` when both occur.
///
/// # Examples
///
/// ```
/// use steward_core::ProjectId;
/// use steward_health::matcher::{LongestMatch, MatchStrategy};
///
/// let short = ProjectId::new("firefly").unwrap();
/// let long = ProjectId::new("hyperledger firefly").unwrap();
/// let text = "hyperledger firefly q3";
/// assert!(LongestMatch.score(text, &long) > LongestMatch.score(text, &short));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestMatch;

impl MatchStrategy for LongestMatch {
    fn score(&self, text: &str, candidate: &ProjectId) -> f64 {
        if text.contains(candidate.as_str()) {
            candidate.as_str().chars().count() as f64
        } else {
            0.0
        }
    }
}

/// Build the strategy selected in configuration.
pub fn strategy_for(kind: MatcherKind) -> Box<dyn MatchStrategy> {
    match kind {
        MatcherKind::Substring => Box::new(SubstringMatch),
        MatcherKind::Longest => Box::new(LongestMatch),
    }
}

/// Outcome of ranking candidates for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch<'a> {
    /// The winning candidate.
    pub project: &'a ProjectId,
    /// Its score.
    pub score: f64,
    /// Other candidates that reached the same score.
    pub tied_with: Vec<&'a ProjectId>,
}

/// Pick the highest-scoring candidate.
///
/// Earlier candidates win ties; the losers of a tie are reported in
/// [`BestMatch::tied_with`].
///
/// # Examples
///
/// ```
/// use steward_core::ProjectId;
/// use steward_health::matcher::{best_match, SubstringMatch};
///
/// let candidates = vec![ProjectId::new("besu").unwrap(), ProjectId::new("iroha").unwrap()];
/// let best = best_match(&SubstringMatch, "iroha q1", &candidates).unwrap();
/// assert_eq!(best.project.as_str(), "iroha");
/// assert!(best_match(&SubstringMatch, "fabric q1", &candidates).is_none());
/// ```
pub fn best_match<'a, I>(
    strategy: &dyn MatchStrategy,
    text: &str,
    candidates: I,
) -> Option<BestMatch<'a>>
where
    I: IntoIterator<Item = &'a ProjectId>,
{
    let mut best: Option<BestMatch<'a>> = None;
    for candidate in candidates {
        let score = strategy.score(text, candidate);
        if score <= 0.0 {
            continue;
        }
        let leads = best.as_ref().map_or(true, |current| score > current.score);
        if leads {
            best = Some(BestMatch {
                project: candidate,
                score,
                tied_with: Vec::new(),
            });
        } else if let Some(current) = best.as_mut().filter(|c| c.score == score) {
            current.tied_with.push(candidate);
        }
    }
    best
}
