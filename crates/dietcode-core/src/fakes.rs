//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides `FakeSourceControl` and `ScriptedCompletion`, which satisfy the
//! trait contracts without any external process or network, and record every
//! call so tests can assert on what the pipeline did (and did not) do.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborators::{
    CheckRun, CompletionOptions, CompletionService, PullRequestInfo, PullRequestRef,
    SourceControl,
};
use crate::domain::{DietCodeError, Result};

// ---------------------------------------------------------------------------
// FakeSourceControl
// ---------------------------------------------------------------------------

/// In-memory source-control service.
///
/// Missing entries behave like the real service: an unknown pull request,
/// check run, or file is a transport error.
#[derive(Debug, Default)]
pub struct FakeSourceControl {
    pull_request: Option<PullRequestInfo>,
    check_runs: Vec<CheckRun>,
    logs: HashMap<u64, String>,
    diff: String,
    files: HashMap<(String, String), String>,
    failing: HashMap<&'static str, String>,
    calls: Mutex<Vec<String>>,
    comments: Mutex<Vec<String>>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pull request returned by `pull_request`.
    pub fn with_pull_request(mut self, title: &str, head_ref: &str) -> Self {
        self.pull_request = Some(PullRequestInfo {
            title: title.to_string(),
            head_ref: head_ref.to_string(),
        });
        self
    }

    /// Append a check run with its log text.
    pub fn with_check(mut self, id: u64, name: &str, conclusion: &str, log: &str) -> Self {
        self.check_runs.push(CheckRun {
            id,
            name: name.to_string(),
            conclusion: Some(conclusion.to_string()),
        });
        self.logs.insert(id, log.to_string());
        self
    }

    pub fn with_diff(mut self, diff: &str) -> Self {
        self.diff = diff.to_string();
        self
    }

    /// Add a file readable at `git_ref`.
    pub fn with_file(mut self, path: &str, git_ref: &str, content: &str) -> Self {
        self.files
            .insert((path.to_string(), git_ref.to_string()), content.to_string());
        self
    }

    /// Make the named operation fail with a transport error.
    pub fn failing_on(mut self, operation: &'static str, message: &str) -> Self {
        self.failing.insert(operation, message.to_string());
        self
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to the named operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    /// Bodies of posted comments, in order.
    pub fn posted_comments(&self) -> Vec<String> {
        self.comments.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(operation.to_string());
        match self.failing.get(operation) {
            Some(message) => Err(DietCodeError::transport("fake-scm", message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo> {
        self.record("pull_request")?;
        self.pull_request
            .clone()
            .ok_or_else(|| DietCodeError::transport("fake-scm", format!("{pr} not found")))
    }

    async fn check_runs(&self, _pr: &PullRequestRef) -> Result<Vec<CheckRun>> {
        self.record("check_runs")?;
        Ok(self.check_runs.clone())
    }

    async fn check_logs(&self, _pr: &PullRequestRef, check_id: u64) -> Result<String> {
        self.record("check_logs")?;
        self.logs.get(&check_id).cloned().ok_or_else(|| {
            DietCodeError::transport("fake-scm", format!("check run {check_id} not found"))
        })
    }

    async fn pull_request_diff(&self, _pr: &PullRequestRef) -> Result<String> {
        self.record("pull_request_diff")?;
        Ok(self.diff.clone())
    }

    async fn file_content(
        &self,
        _pr: &PullRequestRef,
        path: &str,
        git_ref: &str,
    ) -> Result<String> {
        self.record("file_content")?;
        self.files
            .get(&(path.to_string(), git_ref.to_string()))
            .cloned()
            .ok_or_else(|| {
                DietCodeError::transport("fake-scm", format!("{path}@{git_ref} not found"))
            })
    }

    async fn post_comment(&self, _pr: &PullRequestRef, body: &str) -> Result<()> {
        self.record("post_comment")?;
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedCompletion
// ---------------------------------------------------------------------------

/// Completion service that answers every request with the same text (or the
/// same transport error) and records the requests it saw.
#[derive(Debug)]
pub struct ScriptedCompletion {
    response: std::result::Result<String, String>,
    requests: Mutex<Vec<(String, CompletionOptions)>>,
}

impl ScriptedCompletion {
    /// Always answer with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a transport error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Prompt and options of the most recent request.
    pub fn last_request(&self) -> Option<(String, CompletionOptions)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.clone()));
        self.response
            .clone()
            .map_err(|message| DietCodeError::transport("fake-completion", message))
    }
}
