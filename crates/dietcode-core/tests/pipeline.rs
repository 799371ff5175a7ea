//! End-to-end pipeline runs against in-memory collaborators.

use std::sync::Arc;

use dietcode_core::fakes::{FakeSourceControl, ScriptedCompletion};
use dietcode_core::{
    DietCodeError, FailureCategory, FixGenerator, FixGeneratorConfig, FixType, Orchestrator,
    OrchestratorConfig, PipelineResult, PullRequestRef,
};

const FIX_JSON: &str = r#"```json
{
  "fix_type": "add_import",
  "changes": [
    {"file": "src/app.py", "action": "insert", "line_number": 1, "old_content": "", "new_content": "import requests"}
  ],
  "explanation": "Import the requests module",
  "confidence": 0.8
}
```"#;

const MODULE_NOT_FOUND_LOG: &str = "collecting tests\n\
Traceback (most recent call last):\n  \
File \"tests/test_app.py\", line 1, in <module>\n    \
import requests\n\
ModuleNotFoundError: No module named 'requests'\n\
1 error in 0.12s";

fn pr() -> PullRequestRef {
    PullRequestRef::new("octocat", "hello-world", 42)
}

fn orchestrator(
    scm: Arc<FakeSourceControl>,
    completion: Arc<ScriptedCompletion>,
    threshold: f64,
) -> Orchestrator {
    Orchestrator::new(
        scm,
        FixGenerator::new(completion, FixGeneratorConfig::default()),
        OrchestratorConfig {
            confidence_threshold: threshold,
        },
    )
}

#[tokio::test]
async fn no_failed_checks_stops_after_listing() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Add feature", "feature")
            .with_check(1, "pytest", "success", "all passed")
            .with_check(2, "lint", "skipped", ""),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .expect("run");

    assert_eq!(result, PipelineResult::NoFailures);
    assert_eq!(result.message(), "No failed CI checks found");
    assert_eq!(scm.calls(), vec!["pull_request", "check_runs"]);
    assert_eq!(completion.call_count(), 0);
    assert!(scm.posted_comments().is_empty());
}

#[tokio::test]
async fn unrecognized_failure_is_gated() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Refactor", "refactor")
            .with_check(7, "pytest", "failure", "step 3\nerror: the runner went away\nexit 1"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .expect("run");

    let PipelineResult::LowConfidence { diagnosis } = &result else {
        panic!("expected low confidence, got {result:?}");
    };
    assert_eq!(diagnosis.category, FailureCategory::Unknown);
    assert!(diagnosis.confidence < 0.7);
    assert_eq!(result.status(), "low_confidence");
    assert_eq!(completion.call_count(), 0);
    assert_eq!(scm.call_count("file_content"), 0);
    assert_eq!(scm.call_count("post_comment"), 0);
}

#[tokio::test]
async fn failure_log_without_keywords_is_gated() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Docs", "docs")
            .with_check(3, "build", "failure", "killed"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm, completion, 0.7)
        .run(&pr())
        .await
        .expect("run");

    let diagnosis = result.diagnosis().expect("diagnosis");
    assert_eq!(diagnosis.confidence, 0.0);
    assert_eq!(result.status(), "low_confidence");
}

#[tokio::test]
async fn threshold_equal_to_confidence_passes_gate() {
    let log = "  File \"app.py\", line 3\nSyntaxError: invalid syntax";
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Fix", "fix")
            .with_check(1, "pytest", "failure", log)
            .with_file("app.py", "fix", "x = (\n"),
    );

    let passed = orchestrator(scm.clone(), Arc::new(ScriptedCompletion::new(FIX_JSON)), 0.9)
        .run(&pr())
        .await
        .expect("run");
    assert!(passed.is_success());

    let blocked = orchestrator(scm, Arc::new(ScriptedCompletion::new(FIX_JSON)), 0.95)
        .run(&pr())
        .await
        .expect("run");
    assert_eq!(blocked.status(), "low_confidence");
}

#[tokio::test]
async fn unlocatable_file_returns_file_not_found() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Fix", "fix")
            .with_check(1, "pytest", "failure", "SyntaxError: invalid syntax"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .expect("run");

    let PipelineResult::FileNotFound { diagnosis } = &result else {
        panic!("expected file not found, got {result:?}");
    };
    assert_eq!(diagnosis.category, FailureCategory::SyntaxError);
    assert_eq!(result.message(), "Could not locate the affected file");
    assert_eq!(scm.call_count("pull_request_diff"), 0);
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn missing_module_fix_is_posted_for_diff_file() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Use requests", "feature/http")
            .with_check(10, "lint", "success", "")
            .with_check(11, "pytest", "failure", MODULE_NOT_FOUND_LOG)
            .with_diff("diff --git a/src/app.py b/src/app.py\n--- a/src/app.py\n+++ b/src/app.py\n")
            .with_file("src/app.py", "feature/http", "def fetch():\n    return requests.get(URL)\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .expect("run");

    let PipelineResult::Success {
        diagnosis,
        fix,
        affected_file,
    } = &result
    else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(diagnosis.category, FailureCategory::ModuleNotFound);
    assert_eq!(diagnosis.detail("missing_module"), Some("requests"));
    assert_eq!(affected_file, "src/app.py");
    assert_eq!(fix.fix_type, FixType::AddImport);

    assert_eq!(
        scm.calls(),
        vec![
            "pull_request",
            "check_runs",
            "check_logs",
            "pull_request_diff",
            "file_content",
            "post_comment",
        ]
    );

    let (prompt, options) = completion.last_request().expect("completion request");
    assert!(prompt.contains("requests"));
    assert!(prompt.contains("src/app.py"));
    assert!(options.system_prompt.is_some());

    let comments = scm.posted_comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("**CI Check Failed:** `pytest`"));
    assert!(comments[0].contains("`module_not_found`"));
    assert!(comments[0].contains("- **src/app.py** (line 1): insert"));
    assert!(comments[0].contains("**Fix Confidence:** 80%"));
}

#[tokio::test]
async fn missing_module_falls_back_to_traceback_frame() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Docs only", "docs")
            .with_check(5, "pytest", "failure", MODULE_NOT_FOUND_LOG)
            .with_diff("+++ b/README.md\n")
            .with_file("tests/test_app.py", "docs", "import requests\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion, 0.7)
        .run(&pr())
        .await
        .expect("run");

    let PipelineResult::Success { affected_file, .. } = &result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(affected_file, "tests/test_app.py");
    assert_eq!(scm.call_count("pull_request_diff"), 1);
}

#[tokio::test]
async fn missing_dependency_uses_template_without_completion() {
    let log = "Installing requirements\n  \
File \"./setup.py\", line 4\n\
ERROR: Could not find a version that satisfies the requirement numpy==99.0\n\
ERROR: No matching distribution found for numpy==99.0";
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Bump numpy", "bump")
            .with_check(9, "install", "failure", log)
            .with_file("setup.py", "bump", "setup()\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new("not used"));

    let result = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .expect("run");

    let PipelineResult::Success {
        diagnosis,
        fix,
        affected_file,
    } = &result
    else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(diagnosis.category, FailureCategory::MissingDependency);
    assert_eq!(diagnosis.detail("package_name"), Some("numpy==99.0"));
    assert_eq!(affected_file, "setup.py");
    assert_eq!(fix.fix_type, FixType::AddDependency);
    assert_eq!(fix.changes[0].file, "requirements.txt");
    assert_eq!(fix.changes[0].new_content, "numpy==99.0\n");
    assert_eq!(completion.call_count(), 0);
    assert_eq!(scm.posted_comments().len(), 1);
}

#[tokio::test]
async fn only_first_failed_check_is_diagnosed() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Two failures", "two")
            .with_check(1, "unit", "failure", "  File \"a.py\", line 1\nSyntaxError: bad")
            .with_check(2, "integration", "failure", MODULE_NOT_FOUND_LOG)
            .with_file("a.py", "two", "x = (\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let result = orchestrator(scm.clone(), completion, 0.7)
        .run(&pr())
        .await
        .expect("run");

    assert_eq!(
        result.diagnosis().map(|d| d.category),
        Some(FailureCategory::SyntaxError)
    );
    assert_eq!(scm.call_count("check_logs"), 1);
    assert!(scm.posted_comments()[0].contains("`unit`"));
}

#[tokio::test]
async fn missing_pull_request_propagates_transport_error() {
    let scm = Arc::new(FakeSourceControl::new());
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let err = orchestrator(scm.clone(), completion, 0.7)
        .run(&pr())
        .await
        .unwrap_err();

    assert!(matches!(err, DietCodeError::Transport { .. }));
    assert_eq!(scm.calls(), vec!["pull_request"]);
}

#[tokio::test]
async fn failing_check_listing_propagates_unchanged() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Fix", "fix")
            .failing_on("check_runs", "rate limited"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let err = orchestrator(scm, completion, 0.7)
        .run(&pr())
        .await
        .unwrap_err();

    match err {
        DietCodeError::Transport { service, message } => {
            assert_eq!(service, "fake-scm");
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn completion_failure_posts_nothing() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Use requests", "feature")
            .with_check(1, "pytest", "failure", MODULE_NOT_FOUND_LOG)
            .with_diff("+++ b/src/app.py\n")
            .with_file("src/app.py", "feature", "pass\n"),
    );
    let completion = Arc::new(ScriptedCompletion::failing("connection reset"));

    let err = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .unwrap_err();

    assert!(matches!(err, DietCodeError::Transport { .. }));
    assert_eq!(completion.call_count(), 1);
    assert_eq!(scm.call_count("post_comment"), 0);
}

#[tokio::test]
async fn malformed_completion_posts_nothing() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Use requests", "feature")
            .with_check(1, "pytest", "failure", MODULE_NOT_FOUND_LOG)
            .with_diff("+++ b/src/app.py\n")
            .with_file("src/app.py", "feature", "pass\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new("I think you should import requests."));

    let err = orchestrator(scm.clone(), completion, 0.7)
        .run(&pr())
        .await
        .unwrap_err();

    assert!(matches!(err, DietCodeError::MalformedResponse(_)));
    assert!(scm.posted_comments().is_empty());
}

#[tokio::test]
async fn missing_file_at_head_ref_is_transport_error() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Fix", "feature")
            .with_check(1, "pytest", "failure", "  File \"app.py\", line 1\nSyntaxError: x")
            .with_file("app.py", "main", "x = (\n"),
    );
    let completion = Arc::new(ScriptedCompletion::new(FIX_JSON));

    let err = orchestrator(scm.clone(), completion.clone(), 0.7)
        .run(&pr())
        .await
        .unwrap_err();

    assert!(matches!(err, DietCodeError::Transport { .. }));
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn concurrent_runs_share_one_orchestrator() {
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Green", "main")
            .with_check(1, "pytest", "success", ""),
    );
    let orchestrator = orchestrator(scm.clone(), Arc::new(ScriptedCompletion::new(FIX_JSON)), 0.7);

    let first = PullRequestRef::new("o", "r", 1);
    let second = PullRequestRef::new("o", "r", 2);
    let (a, b) = tokio::join!(orchestrator.run(&first), orchestrator.run(&second));

    assert_eq!(a.expect("first run"), PipelineResult::NoFailures);
    assert_eq!(b.expect("second run"), PipelineResult::NoFailures);
    assert_eq!(scm.call_count("check_runs"), 2);
}

#[tokio::test]
async fn success_result_serializes_with_status_tag() {
    let log = "  File \"app.py\", line 3\nSyntaxError: invalid syntax";
    let scm = Arc::new(
        FakeSourceControl::new()
            .with_pull_request("Fix", "fix")
            .with_check(1, "pytest", "failure", log)
            .with_file("app.py", "fix", "x = (\n"),
    );

    let result = orchestrator(scm, Arc::new(ScriptedCompletion::new(FIX_JSON)), 0.7)
        .run(&pr())
        .await
        .expect("run");

    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["status"], "success");
    assert_eq!(json["affected_file"], "app.py");
    assert_eq!(json["diagnosis"]["category"], "syntax_error");
}
