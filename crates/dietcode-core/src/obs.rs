//! Structured observability hooks for DietCode pipeline runs.
//!
//! This module provides:
//! - A run-scoped tracing span via [`pipeline_span`]
//! - Emission functions for each pipeline transition
//!
//! Events are emitted at `info!` level (filterable via `RUST_LOG`).

use tracing::info;

use crate::domain::FailureCategory;

/// Span tagging every event of one pipeline run with its run id and pull
/// request.
///
/// Attach it to the run's future with `tracing::Instrument` rather than
/// entering it, so the span follows the task across `.await` points.
///
/// # Example
///
/// ```ignore
/// orchestrator.run(&pr).instrument(pipeline_span(&run_id, "o/r#1")).await
/// ```
pub fn pipeline_span(run_id: &str, pr: &str) -> tracing::Span {
    tracing::info_span!("dietcode.pipeline", run_id = %run_id, pr = %pr)
}

/// Emit event: pipeline started for a pull request.
pub fn emit_pipeline_started(pr: &str, title: &str) {
    info!(event = "pipeline.started", pr = %pr, title = %title);
}

/// Emit event: check runs listed.
pub fn emit_checks_fetched(total: usize, failed: usize) {
    info!(event = "pipeline.checks_fetched", total = total, failed = failed);
}

/// Emit event: log analysis finished.
pub fn emit_diagnosed(check_name: &str, category: FailureCategory, confidence: f64) {
    info!(
        event = "pipeline.diagnosed",
        check = %check_name,
        category = %category,
        confidence = confidence,
    );
}

/// Emit event: the confidence gate stopped the run.
pub fn emit_gate_blocked(confidence: f64, threshold: f64) {
    info!(
        event = "pipeline.gate_blocked",
        confidence = confidence,
        threshold = threshold,
    );
}

/// Emit event: affected file located.
pub fn emit_file_located(path: &str, source: &str) {
    info!(event = "pipeline.file_located", path = %path, source = %source);
}

/// Emit event: fix proposal generated.
pub fn emit_fix_generated(fix_type: &str, changes: usize, confidence: f64) {
    info!(
        event = "pipeline.fix_generated",
        fix_type = %fix_type,
        changes = changes,
        confidence = confidence,
    );
}

/// Emit event: report comment posted.
pub fn emit_comment_posted(digest: &str, bytes: usize) {
    info!(event = "pipeline.comment_posted", digest = %digest, bytes = bytes);
}

/// Emit event: pipeline reached a terminal state.
pub fn emit_pipeline_finished(status: &str, duration_ms: u64) {
    info!(event = "pipeline.finished", status = %status, duration_ms = duration_ms);
}

/// Emit event: pipeline aborted by a propagated error (warning level).
pub fn emit_pipeline_error(error: &dyn std::fmt::Display) {
    tracing::warn!(event = "pipeline.error", error = %error);
}
