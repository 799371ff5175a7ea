//! Pull request failure pipeline.
//!
//! Sequences one run: fetch PR and check state, analyze the first failed
//! check's log, gate on diagnosis confidence, locate the affected file,
//! generate a fix, and post the rendered report. Steps run strictly in order;
//! every collaborator call is attempted once and its error propagates
//! unchanged. Expected dead ends are returned as [`PipelineResult`] variants.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::analyzer;
use crate::collaborators::{PullRequestRef, SourceControl};
use crate::domain::{Diagnosis, PipelineResult, Result};
use crate::fix_generator::FixGenerator;
use crate::locate::{python_files_in_diff, traceback_file};
use crate::obs;
use crate::report::{comment_digest, render_fix_comment};

/// Pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorConfig {
    /// Diagnoses below this confidence stop the run with `LowConfidence`.
    pub confidence_threshold: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
        }
    }
}

/// Drives the diagnosis and fix pipeline for pull requests.
///
/// Holds only shared, read-only handles, so one instance can serve
/// concurrent runs for different pull requests.
#[derive(Clone)]
pub struct Orchestrator {
    scm: Arc<dyn SourceControl>,
    fix_generator: FixGenerator,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        scm: Arc<dyn SourceControl>,
        fix_generator: FixGenerator,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            scm,
            fix_generator,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process one pull request to a terminal outcome.
    pub async fn run(&self, pr: &PullRequestRef) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::pipeline_span(&run_id, &pr.to_string());

        async {
            let start = Instant::now();
            let outcome = self.process(pr).await;
            match &outcome {
                Ok(result) => {
                    obs::emit_pipeline_finished(result.status(), start.elapsed().as_millis() as u64)
                }
                Err(e) => obs::emit_pipeline_error(e),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn process(&self, pr: &PullRequestRef) -> Result<PipelineResult> {
        let info = self.scm.pull_request(pr).await?;
        obs::emit_pipeline_started(&pr.to_string(), &info.title);

        let checks = self.scm.check_runs(pr).await?;
        let failed: Vec<_> = checks.iter().filter(|c| c.is_failure()).collect();
        obs::emit_checks_fetched(checks.len(), failed.len());

        let Some(check) = failed.first() else {
            return Ok(PipelineResult::NoFailures);
        };

        let logs = self.scm.check_logs(pr, check.id).await?;
        let diagnosis = analyzer::analyze(&logs);
        obs::emit_diagnosed(&check.name, diagnosis.category, diagnosis.confidence);

        if diagnosis.confidence < self.config.confidence_threshold {
            obs::emit_gate_blocked(diagnosis.confidence, self.config.confidence_threshold);
            return Ok(PipelineResult::LowConfidence { diagnosis });
        }

        let Some(affected_file) = self.locate_affected_file(pr, &diagnosis).await? else {
            return Ok(PipelineResult::FileNotFound { diagnosis });
        };

        let file_content = self
            .scm
            .file_content(pr, &affected_file, &info.head_ref)
            .await?;
        debug!(path = %affected_file, bytes = file_content.len(), "fetched affected file");

        let fix = self
            .fix_generator
            .generate_fix(
                diagnosis.category,
                &diagnosis.details,
                &file_content,
                &affected_file,
            )
            .await?;
        obs::emit_fix_generated(fix.fix_type.as_str(), fix.changes.len(), fix.confidence);

        let body = render_fix_comment(&diagnosis, &fix, &check.name);
        self.scm.post_comment(pr, &body).await?;
        obs::emit_comment_posted(&comment_digest(&body), body.len());

        Ok(PipelineResult::Success {
            diagnosis,
            fix,
            affected_file,
        })
    }

    /// Find the file the failure most likely originates from.
    ///
    /// For missing modules the PR diff is consulted first (the first changed
    /// Python file); otherwise, or if the diff has none, the first traceback
    /// frame in the log snippet is used.
    async fn locate_affected_file(
        &self,
        pr: &PullRequestRef,
        diagnosis: &Diagnosis,
    ) -> Result<Option<String>> {
        if diagnosis.detail("missing_module").is_some() {
            let diff = self.scm.pull_request_diff(pr).await?;
            if let Some(path) = python_files_in_diff(&diff).first() {
                obs::emit_file_located(path, "diff");
                return Ok(Some(path.to_string()));
            }
        }

        let located = traceback_file(&diagnosis.log_snippet);
        match &located {
            Some(path) => obs::emit_file_located(path, "traceback"),
            None => debug!("no affected file in diff or traceback"),
        }
        Ok(located)
    }
}
