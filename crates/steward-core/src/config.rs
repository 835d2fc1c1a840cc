use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StewardError;

/// Top-level configuration loaded from `.steward.toml`.
///
/// Every section is optional; missing keys fall back to defaults. The GitHub
/// token is never read from this file, only from the CLI or `GITHUB_TOKEN`.
///
/// # Examples
///
/// ```
/// use steward_core::StewardConfig;
///
/// let config = StewardConfig::default();
/// assert_eq!(config.llm.base_url, "http://localhost:11434");
/// assert_eq!(config.output.result_file.to_str(), Some("analysis_result.txt"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StewardConfig {
    /// Repository to watch.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Inference service settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Project resolution settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Where results are written.
    #[serde(default)]
    pub output: OutputConfig,
}

impl StewardConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::FileNotFound`] if `path` does not exist,
    /// [`StewardError::Io`] if it cannot be read, or [`StewardError::Toml`]
    /// if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use steward_core::StewardConfig;
    /// use std::path::Path;
    ///
    /// let config = StewardConfig::from_file(Path::new(".steward.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, StewardError> {
        if !path.exists() {
            return Err(StewardError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_core::StewardConfig;
    ///
    /// let toml = r#"
    /// [github]
    /// owner = "hyperledger"
    /// repo = "toc"
    /// "#;
    /// let config = StewardConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.github.owner, "hyperledger");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StewardError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Repository coordinates and the schedule document location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository owner (user or organization).
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    #[serde(default)]
    pub repo: String,
    /// Path of the markdown schedule listing tracked projects.
    #[serde(default = "default_schedule_path")]
    pub schedule_path: String,
}

impl GitHubConfig {
    /// Return `(owner, repo)`, failing when either is blank.
    ///
    /// # Errors
    ///
    /// Returns [`StewardError::Config`] if owner or repo is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_core::GitHubConfig;
    ///
    /// let config = GitHubConfig::default();
    /// assert!(config.repository().is_err());
    /// ```
    pub fn repository(&self) -> Result<(&str, &str), StewardError> {
        let owner = self.owner.trim();
        let repo = self.repo.trim();
        if owner.is_empty() || repo.is_empty() {
            return Err(StewardError::Config(
                "github.owner and github.repo must both be set".into(),
            ));
        }
        Ok((owner, repo))
    }
}

fn default_schedule_path() -> String {
    "tac/project-updates/2025/2025-schedule.md".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            schedule_path: default_schedule_path(),
        }
    }
}

/// Inference service configuration.
///
/// Generation parameters (length caps, temperature, stop sequence) are not
/// configurable; they are fixed per pipeline stage.
///
/// # Examples
///
/// ```
/// use steward_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "llama3");
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generate endpoint host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "llama3".into()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Strategy used to rank candidate projects against pull request text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Any candidate that appears as a substring; first in set order wins.
    #[default]
    Substring,
    /// The longest candidate that appears as a substring.
    Longest,
}

/// Project resolution settings.
///
/// # Examples
///
/// ```
/// use steward_core::{MatcherKind, ResolverConfig};
///
/// let config = ResolverConfig::default();
/// assert_eq!(config.matcher, MatcherKind::Substring);
/// assert!(config.infer_with_llm);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Candidate ranking strategy.
    #[serde(default)]
    pub matcher: MatcherKind,
    /// Ask the model for a project name when the heuristics find none.
    #[serde(default = "default_infer_with_llm")]
    pub infer_with_llm: bool,
}

fn default_infer_with_llm() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::default(),
            infer_with_llm: default_infer_with_llm(),
        }
    }
}

/// Result artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File overwritten on every pipeline update.
    #[serde(default = "default_result_file")]
    pub result_file: PathBuf,
}

fn default_result_file() -> PathBuf {
    PathBuf::from("analysis_result.txt")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_file: default_result_file(),
        }
    }
}
