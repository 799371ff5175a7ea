//! Terminal outcome of one pipeline run.

use serde::{Deserialize, Serialize};

use super::diagnosis::Diagnosis;
use super::fix::FixProposal;

/// Outcome of processing one pull request.
///
/// Exactly one variant is produced per run. The first three are expected,
/// non-error outcomes; collaborator failures are reported as
/// [`crate::DietCodeError`] instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineResult {
    /// The pull request has no failed CI checks.
    NoFailures,

    /// The diagnosis confidence was below the configured threshold.
    LowConfidence { diagnosis: Diagnosis },

    /// No file could be associated with the failure.
    FileNotFound { diagnosis: Diagnosis },

    /// A fix was generated and posted.
    Success {
        diagnosis: Diagnosis,
        fix: FixProposal,
        affected_file: String,
    },
}

impl PipelineResult {
    /// Status tag, matching the serialized `status` field.
    pub fn status(&self) -> &'static str {
        match self {
            PipelineResult::NoFailures => "no_failures",
            PipelineResult::LowConfidence { .. } => "low_confidence",
            PipelineResult::FileNotFound { .. } => "file_not_found",
            PipelineResult::Success { .. } => "success",
        }
    }

    /// Human-readable description of the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            PipelineResult::NoFailures => "No failed CI checks found",
            PipelineResult::LowConfidence { .. } => "Unable to confidently diagnose the failure",
            PipelineResult::FileNotFound { .. } => "Could not locate the affected file",
            PipelineResult::Success { .. } => "Posted fix suggestion to the pull request",
        }
    }

    /// Diagnosis carried by the outcome, if analysis ran.
    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match self {
            PipelineResult::NoFailures => None,
            PipelineResult::LowConfidence { diagnosis }
            | PipelineResult::FileNotFound { diagnosis }
            | PipelineResult::Success { diagnosis, .. } => Some(diagnosis),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }
}
