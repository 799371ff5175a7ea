//! DietCode Core Library
//!
//! Diagnoses failed CI checks on pull requests, asks a completion service for
//! a fix, and posts the proposal as a pull request comment.

pub mod analyzer;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod fix_generator;
pub mod fix_response;
pub mod locate;
pub mod obs;
pub mod orchestrator;
pub mod report;
pub mod telemetry;

pub use analyzer::{analyze, extract_error_lines};

pub use collaborators::{
    CheckRun, CompletionOptions, CompletionService, PullRequestInfo, PullRequestRef,
    SourceControl,
};

pub use config::AgentConfig;

pub use domain::{
    ChangeAction, ChangeOp, Diagnosis, DietCodeError, FailureCategory, FixProposal, FixType,
    PipelineResult, Result, APPEND_LINE,
};

pub use fix_generator::{FixGenerator, FixGeneratorConfig};
pub use fix_response::parse_fix_response;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use report::render_fix_comment;
pub use telemetry::init_tracing;

/// Crate version, as recorded in the workspace manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
