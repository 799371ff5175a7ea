//! Domain models for DietCode.
//!
//! Canonical definitions for the pipeline's values:
//! - `FailureCategory`: closed set of recognised CI failures
//! - `Diagnosis`: structured result of log analysis
//! - `FixProposal` / `ChangeOp`: proposed edits
//! - `PipelineResult`: terminal outcome of one run

pub mod category;
pub mod diagnosis;
pub mod error;
pub mod fix;
pub mod outcome;

pub use category::FailureCategory;
pub use diagnosis::Diagnosis;
pub use error::{DietCodeError, Result};
pub use fix::{ChangeAction, ChangeOp, FixProposal, FixType, APPEND_LINE};
pub use outcome::PipelineResult;
