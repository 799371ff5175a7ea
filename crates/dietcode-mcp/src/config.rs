//! MCP server configuration.
//!
//! The file format is the common `mcpServers` layout:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "github": {
//!       "command": "npx",
//!       "args": ["-y", "@modelcontextprotocol/server-github"],
//!       "env": { "GITHUB_PERSONAL_ACCESS_TOKEN": "${GITHUB_TOKEN}" }
//!     }
//!   }
//! }
//! ```
//!
//! An env value that is exactly `${NAME}` is replaced with the value of
//! `NAME` at load time, or the empty string when it is unset.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{McpError, Result};

/// How to launch one MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment for the server process, on top of the inherited one.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// All configured MCP servers, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(rename = "mcpServers")]
    pub servers: BTreeMap<String, ServerConfig>,
}

/// Resolve a `${NAME}` placeholder; other values pass through unchanged.
pub fn substitute_env<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(name) => lookup(name).unwrap_or_default(),
        None => value.to_string(),
    }
}

impl McpConfig {
    /// Load from a file, substituting placeholders from the process env.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = std::fs::read_to_string(path)
            .map_err(|e| McpError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&text, lookup)
    }

    /// Parse configuration text.
    pub fn parse<F>(text: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: McpConfig =
            serde_json::from_str(text).map_err(|e| McpError::Config(e.to_string()))?;

        for (name, server) in config.servers.iter_mut() {
            if server.command.trim().is_empty() {
                return Err(McpError::Config(format!(
                    "server '{name}' has an empty command"
                )));
            }
            for value in server.env.values_mut() {
                *value = substitute_env(value, &lookup);
            }
        }

        Ok(config)
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }
}
