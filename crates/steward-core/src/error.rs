use std::path::PathBuf;

/// Errors that can occur across the Steward crates.
///
/// Transport failures (`GitHub`, `Llm`) abort the pull request being
/// processed but never the whole run. `Schedule` is raised while parsing the
/// schedule document and is always handled inside candidate discovery.
///
/// # Examples
///
/// ```
/// use steward_core::StewardError;
///
/// let err = StewardError::Config("missing repository owner".into());
/// assert!(err.to_string().contains("missing repository owner"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StewardError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check the [github], [llm] and [output] sections of .steward.toml"))]
    Config(String),

    /// GitHub API or download failure.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Inference API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The schedule document is missing or has no project table.
    #[error("schedule error: {0}")]
    Schedule(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl StewardError {
    /// Whether the error came from a remote collaborator (GitHub or the LLM).
    ///
    /// # Examples
    ///
    /// ```
    /// use steward_core::StewardError;
    ///
    /// assert!(StewardError::Llm("503".into()).is_transport());
    /// assert!(!StewardError::Schedule("no table".into()).is_transport());
    /// ```
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::GitHub(_) | Self::Llm(_))
    }
}
