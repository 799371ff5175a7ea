//! Error types for dietcode-mcp

use dietcode_core::DietCodeError;
use thiserror::Error;

/// Errors raised while talking to MCP servers.
#[derive(Error, Debug)]
pub enum McpError {
    /// No entry for the server in the MCP configuration
    #[error("MCP server '{0}' is not configured")]
    ServerNotConfigured(String),

    /// The server process could not be started
    #[error("failed to start MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },

    /// The server closed its stdout before answering
    #[error("MCP server '{0}' closed the connection")]
    Closed(String),

    /// No response within the request timeout
    #[error("MCP request '{method}' to '{server}' timed out after {secs}s")]
    Timeout {
        server: String,
        method: String,
        secs: u64,
    },

    /// JSON-RPC `error` member in the response
    #[error("MCP error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Tool result flagged with `isError`
    #[error("MCP tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// Response did not have the expected shape
    #[error("unexpected MCP response: {0}")]
    Protocol(String),

    /// Unreadable or invalid configuration file
    #[error("invalid MCP configuration: {0}")]
    Config(String),

    /// IO error on the server pipes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, McpError>;

impl McpError {
    /// The server process can no longer be used after this error.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            McpError::Closed(_) | McpError::Io(_) | McpError::Timeout { .. }
        )
    }
}

impl From<McpError> for DietCodeError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Config(message) => DietCodeError::Config(message),
            other => DietCodeError::transport("mcp", other.to_string()),
        }
    }
}
