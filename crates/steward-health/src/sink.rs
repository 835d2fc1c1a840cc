use std::path::{Path, PathBuf};

use steward_core::{ProjectId, StewardError};
use tracing::info;

/// Persists pipeline progress.
///
/// Every write replaces the previous one entirely; only the most recent
/// write, for whichever project wrote last, is kept.
pub trait ResultSink: Send + Sync {
    /// Replace the stored result with `content` for `project`.
    fn write(&self, project: &ProjectId, content: &str) -> Result<(), StewardError>;
}

/// The persisted form of one result.
///
/// # Examples
///
/// ```
/// use steward_core::ProjectId;
/// use steward_health::sink::render_result;
///
/// let besu = ProjectId::new("besu").unwrap();
/// assert_eq!(render_result(&besu, "Final Summary:\nok"), "besu:\n\nFinal Summary:\nok\n");
/// ```
pub fn render_result(project: &ProjectId, content: &str) -> String {
    format!("{project}:\n\n{content}\n")
}

/// Writes results to a single file.
///
/// Content is written to a sibling temporary file and renamed over the
/// target, so readers see either the previous or the new result.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the result file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ResultSink for FileSink {
    fn write(&self, project: &ProjectId, content: &str) -> Result<(), StewardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.staging_path();
        std::fs::write(&staging, render_result(project, content))?;
        std::fs::rename(&staging, &self.path)?;
        info!(%project, path = %self.path.display(), "overwrote results");
        Ok(())
    }
}
