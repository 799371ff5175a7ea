//! GitHub source control over an MCP server.
//!
//! Maps [`SourceControl`] operations onto the GitHub MCP server's tools.
//! Responses that do not have the expected shape are transport errors
//! attributed to `github`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use dietcode_core::collaborators::{CheckRun, PullRequestInfo, PullRequestRef, SourceControl};
use dietcode_core::{DietCodeError, Result};

use crate::client::{json_content, text_content, McpClient};

/// Default server name in the MCP configuration.
pub const GITHUB_SERVER: &str = "github";

fn shape_error(message: impl Into<String>) -> DietCodeError {
    DietCodeError::transport("github", message)
}

/// Title and head ref from a `get_pull_request` payload.
pub fn parse_pull_request(payload: &Value) -> Result<PullRequestInfo> {
    let title = payload
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| shape_error("pull request has no title"))?;
    let head_ref = payload
        .pointer("/head/ref")
        .and_then(Value::as_str)
        .ok_or_else(|| shape_error("pull request has no head.ref"))?;

    Ok(PullRequestInfo {
        title: title.to_string(),
        head_ref: head_ref.to_string(),
    })
}

/// Check runs from a `list_check_runs` payload, either a bare array or the
/// REST envelope `{"total_count": n, "check_runs": [...]}`.
pub fn parse_check_runs(payload: &Value) -> Result<Vec<CheckRun>> {
    let runs = payload
        .as_array()
        .or_else(|| payload.get("check_runs").and_then(Value::as_array))
        .ok_or_else(|| shape_error("check run listing is not an array"))?;

    runs.iter()
        .map(|run| {
            let id = run
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| shape_error("check run has no numeric id"))?;
            let name = run
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error(format!("check run {id} has no name")))?;
            Ok(CheckRun {
                id,
                name: name.to_string(),
                conclusion: run
                    .get("conclusion")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

/// File text from a `get_file_contents` result.
///
/// Accepts raw text, or a contents-API object whose `content` is plain or
/// base64-encoded.
pub fn decode_file_content(text: &str) -> Result<String> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) else {
        return Ok(text.to_string());
    };
    let Some(content) = object.get("content").and_then(Value::as_str) else {
        return Ok(text.to_string());
    };

    if object.get("encoding").and_then(Value::as_str) != Some("base64") {
        return Ok(content.to_string());
    }

    let compact: String = content.split_whitespace().collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| shape_error(format!("invalid base64 file content: {e}")))?;
    String::from_utf8(bytes).map_err(|_| shape_error("file content is not UTF-8"))
}

/// [`SourceControl`] backed by the GitHub MCP server.
#[derive(Clone)]
pub struct GitHubMcp {
    client: Arc<McpClient>,
    server: String,
}

impl GitHubMcp {
    pub fn new(client: Arc<McpClient>) -> Self {
        Self {
            client,
            server: GITHUB_SERVER.to_string(),
        }
    }

    /// Use a differently named server entry.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        Ok(self.client.call_tool(&self.server, tool, arguments).await?)
    }

    async fn call_json(&self, tool: &str, arguments: Value) -> Result<Value> {
        let result = self.call(tool, arguments).await?;
        Ok(json_content(&result)?)
    }

    async fn call_text(&self, tool: &str, arguments: Value) -> Result<String> {
        let result = self.call(tool, arguments).await?;
        Ok(text_content(&result))
    }
}

#[async_trait]
impl SourceControl for GitHubMcp {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequestInfo> {
        let payload = self
            .call_json(
                "get_pull_request",
                json!({ "owner": pr.owner, "repo": pr.repo, "pull_number": pr.number }),
            )
            .await?;
        parse_pull_request(&payload)
    }

    async fn check_runs(&self, pr: &PullRequestRef) -> Result<Vec<CheckRun>> {
        let payload = self
            .call_json(
                "list_check_runs",
                json!({ "owner": pr.owner, "repo": pr.repo, "pull_number": pr.number }),
            )
            .await?;
        parse_check_runs(&payload)
    }

    async fn check_logs(&self, pr: &PullRequestRef, check_id: u64) -> Result<String> {
        self.call_text(
            "get_check_run_logs",
            json!({ "owner": pr.owner, "repo": pr.repo, "check_run_id": check_id }),
        )
        .await
    }

    async fn pull_request_diff(&self, pr: &PullRequestRef) -> Result<String> {
        self.call_text(
            "get_pull_request_diff",
            json!({ "owner": pr.owner, "repo": pr.repo, "pull_number": pr.number }),
        )
        .await
    }

    async fn file_content(&self, pr: &PullRequestRef, path: &str, git_ref: &str) -> Result<String> {
        let text = self
            .call_text(
                "get_file_contents",
                json!({ "owner": pr.owner, "repo": pr.repo, "path": path, "ref": git_ref }),
            )
            .await?;
        decode_file_content(&text)
    }

    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<()> {
        self.call(
            "create_issue_comment",
            json!({ "owner": pr.owner, "repo": pr.repo, "issue_number": pr.number, "body": body }),
        )
        .await?;
        Ok(())
    }
}
