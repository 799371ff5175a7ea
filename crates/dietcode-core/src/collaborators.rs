//! Collaborator trait definitions for DietCode
//!
//! The pipeline reaches the outside world only through these traits:
//! - `SourceControl`: pull request, check run and repository queries/commands
//! - `CompletionService`: text completion backed by a language model
//!
//! All traits are async and backend-agnostic. Implementations treat each call
//! as a stateless request/response; the core never retries. In-memory fakes
//! are provided for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Result;

// ---------------------------------------------------------------------------
// SourceControl
// ---------------------------------------------------------------------------

/// Identifies a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Pull request metadata needed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub title: String,

    /// Head branch ref; file contents are read at this ref.
    pub head_ref: String,
}

/// One CI check run attached to a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,

    /// `None` while the check is still running.
    pub conclusion: Option<String>,
}

impl CheckRun {
    /// Whether the check concluded with `failure`.
    pub fn is_failure(&self) -> bool {
        self.conclusion.as_deref() == Some("failure")
    }
}

/// Pull request and repository operations.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fetch pull request metadata. Fails if the pull request does not exist.
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo>;

    /// List check runs for the pull request, in listing order.
    async fn check_runs(&self, pr: &PullRequestRef) -> Result<Vec<CheckRun>>;

    /// Fetch the raw log text of a check run.
    async fn check_logs(&self, pr: &PullRequestRef, check_id: u64) -> Result<String>;

    /// Fetch the pull request's unified diff.
    async fn pull_request_diff(&self, pr: &PullRequestRef) -> Result<String>;

    /// Fetch a file's content at the given git ref.
    async fn file_content(&self, pr: &PullRequestRef, path: &str, git_ref: &str)
        -> Result<String>;

    /// Post a comment on the pull request.
    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// CompletionService
// ---------------------------------------------------------------------------

/// Options for a single completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,

    /// Optional system instruction sent ahead of the prompt.
    pub system_prompt: Option<String>,
}

/// Text completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `prompt`, returning the raw response text.
    ///
    /// The text is untrusted: callers must validate any structure they expect.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}
