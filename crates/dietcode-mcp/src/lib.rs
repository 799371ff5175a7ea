//! DietCode MCP: external service adapters
//!
//! Implements the core collaborator traits against real services:
//! - [`GitHubMcp`]: `SourceControl` via the GitHub MCP server
//! - [`OpenAiCompletion`]: `CompletionService` via an OpenAI-compatible API
//!
//! MCP servers are child processes managed by [`McpClient`]; call
//! [`McpClient::close`] when done.

pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod openai;

pub use client::McpClient;
pub use config::{McpConfig, ServerConfig};
pub use error::{McpError, Result};
pub use github::{GitHubMcp, GITHUB_SERVER};
pub use openai::OpenAiCompletion;
