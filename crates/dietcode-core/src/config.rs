//! Agent configuration.
//!
//! Configuration is read once, at the process boundary, and handed to the
//! components that need it. Nothing below the binary reads the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{DietCodeError, Result};
use crate::fix_generator::FixGeneratorConfig;
use crate::orchestrator::OrchestratorConfig;

/// Environment keys understood by [`AgentConfig::from_env`].
pub mod keys {
    pub const CONFIDENCE_THRESHOLD: &str = "PATCH_CONFIDENCE_THRESHOLD";
    pub const MODEL: &str = "OPENAI_MODEL";
    pub const TEMPERATURE: &str = "OPENAI_TEMPERATURE";
    pub const API_KEY: &str = "OPENAI_API_KEY";
    pub const API_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const MCP_CONFIG_PATH: &str = "MCP_CONFIG_PATH";
    pub const LOG_DIR: &str = "DIETCODE_LOG_DIR";
}

/// Complete process configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Minimum diagnosis confidence required to attempt a fix.
    pub confidence_threshold: f64,

    /// Completion model identifier.
    pub model: String,

    /// Completion sampling temperature.
    pub temperature: f32,

    /// Completion API key.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API.
    pub api_base_url: String,

    /// Path to the MCP server configuration file.
    pub mcp_config_path: PathBuf,

    /// Directory for daily log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.3,
            api_key: None,
            api_base_url: "https://api.openai.com/v1".to_string(),
            mcp_config_path: PathBuf::from("./config/mcp_config.json"),
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DietCodeError::Config(format!("{key} must be a number, got {raw:?}")))
}

impl AgentConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(keys::CONFIDENCE_THRESHOLD) {
            config.confidence_threshold = parse_number(keys::CONFIDENCE_THRESHOLD, &raw)?;
        }
        if let Some(model) = lookup(keys::MODEL) {
            config.model = model;
        }
        if let Some(raw) = lookup(keys::TEMPERATURE) {
            config.temperature = parse_number(keys::TEMPERATURE, &raw)?;
        }
        config.api_key = lookup(keys::API_KEY).filter(|k| !k.is_empty());
        if let Some(url) = lookup(keys::API_BASE_URL) {
            config.api_base_url = url;
        }
        if let Some(path) = lookup(keys::MCP_CONFIG_PATH) {
            config.mcp_config_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(keys::LOG_DIR) {
            config.log_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DietCodeError::Config(format!(
                "confidence threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DietCodeError::Config(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        if self.model.trim().is_empty() {
            return Err(DietCodeError::Config("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            confidence_threshold: self.confidence_threshold,
        }
    }

    pub fn fix_generator(&self) -> FixGeneratorConfig {
        FixGeneratorConfig {
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
