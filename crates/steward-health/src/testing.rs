//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use steward_core::{ProjectId, PullRequest, RepoFile, StewardError};

use crate::llm::{GenerationOptions, InferenceService};
use crate::sink::{render_result, ResultSink};
use crate::source::ReportSource;

#[derive(Default)]
pub(crate) struct FakeSource {
    files: Vec<RepoFile>,
    contents: HashMap<String, String>,
    pull_requests: Vec<PullRequest>,
    pr_files: HashMap<u64, Vec<RepoFile>>,
    failing_pr_files: HashSet<u64>,
    failing_reads: HashSet<String>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(mut self, path: &str, content: &str) -> Self {
        let url = format!("mem://repo/{path}");
        self.contents.insert(url.clone(), content.to_string());
        self.files.push(RepoFile::file(path, Some(url)));
        self
    }

    pub(crate) fn with_pull_request(mut self, pr: PullRequest) -> Self {
        self.pull_requests.push(pr);
        self
    }

    pub(crate) fn with_pr_file(mut self, number: u64, path: &str, content: &str) -> Self {
        let url = format!("mem://pr/{number}/{path}");
        self.contents.insert(url.clone(), content.to_string());
        self.pr_files
            .entry(number)
            .or_default()
            .push(RepoFile::file(path, Some(url)));
        self
    }

    /// A changed file with no download URL, carrying only `patch`.
    pub(crate) fn with_pr_patch(mut self, number: u64, path: &str, patch: Option<&str>) -> Self {
        let mut file = RepoFile::file(path, None);
        file.patch = patch.map(str::to_string);
        self.pr_files.entry(number).or_default().push(file);
        self
    }

    pub(crate) fn with_failing_pr_files(mut self, number: u64) -> Self {
        self.failing_pr_files.insert(number);
        self
    }

    pub(crate) fn with_failing_read(mut self, path: &str) -> Self {
        self.failing_reads.insert(path.to_string());
        self
    }
}

#[async_trait]
impl ReportSource for FakeSource {
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>, StewardError> {
        Ok(self.pull_requests.clone())
    }

    async fn list_files(&self, path: &str) -> Result<Vec<RepoFile>, StewardError> {
        Ok(self
            .files
            .iter()
            .filter(|f| f.path.starts_with(path))
            .cloned()
            .collect())
    }

    async fn read_file(&self, file: &RepoFile) -> Result<String, StewardError> {
        if self.failing_reads.contains(&file.path) {
            return Err(StewardError::GitHub(format!("500 reading {}", file.path)));
        }
        match &file.download_url {
            Some(url) => self
                .contents
                .get(url)
                .cloned()
                .ok_or_else(|| StewardError::GitHub(format!("404 {url}"))),
            None => Ok(file.patch.clone().unwrap_or_default()),
        }
    }

    async fn file_by_path(&self, path: &str) -> Result<RepoFile, StewardError> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .cloned()
            .ok_or_else(|| StewardError::GitHub(format!("404 {path}")))
    }

    async fn list_pull_request_files(&self, number: u64) -> Result<Vec<RepoFile>, StewardError> {
        if self.failing_pr_files.contains(&number) {
            return Err(StewardError::GitHub(format!("502 files of #{number}")));
        }
        Ok(self.pr_files.get(&number).cloned().unwrap_or_default())
    }
}

/// Replies with scripted responses in order; errors once they run out.
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    options: Mutex<Vec<GenerationOptions>>,
}

impl ScriptedLlm {
    pub(crate) fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn options(&self) -> Vec<GenerationOptions> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceService for ScriptedLlm {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, StewardError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.options.lock().unwrap().push(options.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(StewardError::Llm(message)),
            None => Err(StewardError::Llm("no scripted response left".into())),
        }
    }
}

/// Keeps every rendered write in order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    writes: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<String> {
        self.writes.lock().unwrap().last().cloned()
    }
}

impl ResultSink for RecordingSink {
    fn write(&self, project: &ProjectId, content: &str) -> Result<(), StewardError> {
        self.writes
            .lock()
            .unwrap()
            .push(render_result(project, content));
        Ok(())
    }
}
