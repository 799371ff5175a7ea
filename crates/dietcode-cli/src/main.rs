//! DietCode CLI
//!
//! `dietcode <owner> <repo> <pr_number>` diagnoses the first failed CI check
//! on a pull request and, when confident, posts a fix suggestion comment.
//!
//! Configuration comes from the environment (a `.env` file is loaded first);
//! see `dietcode_core::config::keys` for the recognised variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, Level};

use dietcode_core::{
    AgentConfig, FixGenerator, Orchestrator, PipelineResult, PullRequestRef,
};
use dietcode_mcp::{GitHubMcp, McpClient, McpConfig, OpenAiCompletion};

#[derive(Parser, Debug)]
#[command(name = "dietcode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnose failed CI checks on a pull request and suggest a fix", long_about = None)]
struct Cli {
    /// Repository owner
    owner: String,

    /// Repository name
    repo: String,

    /// Pull request number
    pr_number: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Minimum diagnosis confidence required to propose a fix
    #[arg(long)]
    threshold: Option<f64>,

    /// Path to the MCP server configuration file
    #[arg(long)]
    mcp_config: Option<PathBuf>,

    /// Completion model
    #[arg(long)]
    model: Option<String>,
}

impl Cli {
    fn pull_request(&self) -> PullRequestRef {
        PullRequestRef::new(&self.owner, &self.repo, self.pr_number)
    }
}

/// Apply command-line overrides on top of environment configuration.
fn apply_overrides(mut config: AgentConfig, cli: &Cli) -> Result<AgentConfig> {
    if let Some(threshold) = cli.threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(path) = &cli.mcp_config {
        config.mcp_config_path = path.clone();
    }
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run_pipeline(config: &AgentConfig, pr: &PullRequestRef) -> Result<PipelineResult> {
    let mcp_config = McpConfig::load(&config.mcp_config_path).with_context(|| {
        format!(
            "Failed to load MCP configuration from {}",
            config.mcp_config_path.display()
        )
    })?;
    let client = Arc::new(McpClient::new(mcp_config));

    let completion = OpenAiCompletion::new(&config.api_base_url, config.api_key.clone())?;
    let orchestrator = Orchestrator::new(
        Arc::new(GitHubMcp::new(client.clone())),
        FixGenerator::new(Arc::new(completion), config.fix_generator()),
        config.orchestrator(),
    );

    let result = orchestrator.run(pr).await;
    client.close().await;

    result.with_context(|| format!("Failed to process {pr}"))
}

/// Banner plus pretty JSON of the outcome, including its message.
fn render_result(result: &PipelineResult) -> Result<String> {
    let mut json = serde_json::to_value(result)?;
    if let Value::Object(map) = &mut json {
        map.insert("message".to_string(), Value::from(result.message()));
    }

    let rule = "=".repeat(50);
    Ok(format!(
        "\n{rule}\nRESULT:\n{rule}\n{}",
        serde_json::to_string_pretty(&json)?
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AgentConfig::from_env().context("Invalid configuration")?;
    let config = apply_overrides(config, &cli)?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = dietcode_core::init_tracing(cli.json, level, config.log_dir.as_deref())
        .context("Failed to initialise logging")?;
    if let Some(path) = log_file {
        info!(path = %path.display(), "logging to file");
    }

    let pr = cli.pull_request();
    info!(pr = %pr, model = %config.model, threshold = config.confidence_threshold, "processing pull request");

    let result = run_pipeline(&config, &pr).await?;
    println!("{}", render_result(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use dietcode_core::{Diagnosis, FailureCategory};

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_positional_arguments() {
        let cli = Cli::try_parse_from(["dietcode", "octocat", "Hello-World", "123"]).expect("parse");
        assert_eq!(cli.pull_request(), PullRequestRef::new("octocat", "Hello-World", 123));
        assert!(!cli.verbose);
        assert!(cli.threshold.is_none());
    }

    #[test]
    fn test_non_numeric_pr_number_rejected() {
        assert!(Cli::try_parse_from(["dietcode", "o", "r", "abc"]).is_err());
        assert!(Cli::try_parse_from(["dietcode", "o", "r"]).is_err());
    }

    #[test]
    fn test_overrides_replace_environment_values() {
        let cli = Cli::try_parse_from([
            "dietcode",
            "o",
            "r",
            "1",
            "--threshold",
            "0.5",
            "--mcp-config",
            "/tmp/mcp.json",
            "--model",
            "gpt-4o",
        ])
        .expect("parse");

        let config = apply_overrides(AgentConfig::default(), &cli).expect("overrides");
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.mcp_config_path, PathBuf::from("/tmp/mcp.json"));
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let cli = Cli::try_parse_from(["dietcode", "o", "r", "1", "--threshold", "1.5"])
            .expect("parse");
        assert!(apply_overrides(AgentConfig::default(), &cli).is_err());
    }

    #[test]
    fn test_render_result_includes_status_and_message() {
        let result = PipelineResult::LowConfidence {
            diagnosis: Diagnosis::unrecognized("error: boom".to_string()),
        };
        let rendered = render_result(&result).expect("render");

        assert!(rendered.contains("RESULT:"));
        let json_start = rendered.find('{').expect("json");
        let json: Value = serde_json::from_str(&rendered[json_start..]).expect("json");
        assert_eq!(json["status"], "low_confidence");
        assert_eq!(json["message"], "Unable to confidently diagnose the failure");
        assert_eq!(
            json["diagnosis"]["category"],
            FailureCategory::Unknown.as_str()
        );
    }

    #[tokio::test]
    async fn test_missing_mcp_config_fails() {
        let config = AgentConfig {
            mcp_config_path: PathBuf::from("/nonexistent/dietcode/mcp_config.json"),
            ..Default::default()
        };
        let err = run_pipeline(&config, &PullRequestRef::new("o", "r", 1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MCP configuration"));
    }
}
