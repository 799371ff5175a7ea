//! Stdio MCP client.
//!
//! Each configured server runs as a child process speaking newline-delimited
//! JSON-RPC 2.0 on stdin/stdout. A server is spawned on its first tool call
//! and initialized with the `initialize` / `notifications/initialized`
//! handshake. Requests are serialized through one lock; the pipeline issues
//! them strictly in order anyway.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::McpConfig;
use crate::error::{McpError, Result};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Default time allowed for a single request, handshake included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Grace period for a server to exit after its stdin is closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct ServerProcess {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ServerProcess {
    async fn send(&mut self, message: &Value) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` arrives. Notifications,
    /// server-initiated requests and non-JSON output are skipped.
    async fn read_response(&mut self, id: u64) -> Result<Value> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(McpError::Closed(self.name.clone()));
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(line) {
                Ok(message) => message,
                Err(_) => {
                    debug!(server = %self.name, "skipping non-JSON output line");
                    continue;
                }
            };

            if message.get("id").and_then(Value::as_u64) != Some(id)
                || message.get("method").is_some()
            {
                debug!(server = %self.name, "skipping unrelated message");
                continue;
            }

            if let Some(error) = message.get("error") {
                return Err(McpError::Rpc {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                });
            }

            return Ok(message.get("result").cloned().unwrap_or(Value::Null));
        }
    }
}

/// Client for the MCP servers named in an [`McpConfig`].
pub struct McpClient {
    config: McpConfig,
    servers: Mutex<HashMap<String, ServerProcess>>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl McpClient {
    pub fn new(config: McpConfig) -> Self {
        Self {
            config,
            servers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Names of servers currently running.
    pub async fn running_servers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Call `tool` on `server` and return the raw `tools/call` result.
    ///
    /// A result flagged with `isError` is reported as [`McpError::ToolFailed`].
    /// A server whose connection is lost is removed and started again on the
    /// next call.
    pub async fn call_tool(&self, server: &str, tool: &str, arguments: Value) -> Result<Value> {
        let mut servers = self.servers.lock().await;
        if !servers.contains_key(server) {
            let process = self.start_server(server).await?;
            servers.insert(server.to_string(), process);
        }
        let process = servers
            .get_mut(server)
            .ok_or_else(|| McpError::ServerNotConfigured(server.to_string()))?;

        debug!(server = %server, tool = %tool, "calling MCP tool");
        let result = match self
            .request(
                process,
                "tools/call",
                json!({ "name": tool, "arguments": arguments }),
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                // A dead or wedged process is respawned on the next call.
                if e.is_connection_lost() {
                    warn!(server = %server, error = %e, "dropping MCP server");
                    servers.remove(server);
                }
                return Err(e);
            }
        };

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(McpError::ToolFailed {
                tool: tool.to_string(),
                message: text_content(&result),
            });
        }
        Ok(result)
    }

    /// Stop every running server. Safe to call more than once.
    pub async fn close(&self) {
        let mut servers = self.servers.lock().await;
        for (name, process) in servers.drain() {
            let ServerProcess {
                mut child, stdin, ..
            } = process;
            drop(stdin);

            match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!(server = %name, %status, "MCP server exited"),
                Ok(Err(e)) => warn!(server = %name, error = %e, "waiting for MCP server failed"),
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!(server = %name, error = %e, "failed to kill MCP server");
                    }
                }
            }
            info!(server = %name, "stopped MCP server");
        }
    }

    async fn start_server(&self, name: &str) -> Result<ServerProcess> {
        let config = self
            .config
            .server(name)
            .ok_or_else(|| McpError::ServerNotConfigured(name.to_string()))?;

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| McpError::Spawn {
                server: name.to_string(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol(format!("no stdin for server '{name}'")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol(format!("no stdout for server '{name}'")))?;

        let mut process = ServerProcess {
            name: name.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        self.request(
            &mut process,
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "dietcode", "version": env!("CARGO_PKG_VERSION") },
            }),
        )
        .await?;
        process
            .send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await?;

        info!(server = %name, command = %config.command, "started MCP server");
        Ok(process)
    }

    async fn request(
        &self,
        process: &mut ServerProcess,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        process
            .send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await?;

        tokio::time::timeout(self.request_timeout, process.read_response(id))
            .await
            .map_err(|_| McpError::Timeout {
                server: process.name.clone(),
                method: method.to_string(),
                secs: self.request_timeout.as_secs(),
            })?
    }
}

/// Concatenated `text` blocks of a tool result's `content` array.
pub fn text_content(result: &Value) -> String {
    result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Structured payload of a tool result: `structuredContent` when present,
/// otherwise the text content decoded as JSON.
pub fn json_content(result: &Value) -> Result<Value> {
    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }
    let text = text_content(result);
    serde_json::from_str(&text)
        .map_err(|e| McpError::Protocol(format!("tool result is not JSON: {e}")))
}
