//! Fix generation for diagnosed CI failures.
//!
//! Given a diagnosis category and the affected file, produces a
//! [`FixProposal`]. Mechanical categories are handled with fixed templates;
//! everything that needs to understand the source file is delegated to the
//! [`CompletionService`] and validated by [`crate::fix_response`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::{CompletionOptions, CompletionService};
use crate::domain::{ChangeOp, FailureCategory, FixProposal, FixType, Result, APPEND_LINE};
use crate::fix_response::parse_fix_response;

/// File that receives missing-dependency fixes.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Confidence of the templated missing-dependency fix.
pub const DEPENDENCY_FIX_CONFIDENCE: f64 = 0.85;

const JSON_ONLY_SYSTEM_PROMPT: &str =
    "You are a code repair assistant. Respond only with valid JSON.";

const RESPONSE_CONTRACT: &str = r#"Respond in JSON format:
{
  "fix_type": "add_import" | "fix_import" | "add_dependency" | "fix_path" | "create_file",
  "changes": [
    {
      "file": "path/to/file",
      "action": "insert" | "replace" | "delete",
      "line_number": 5,
      "old_content": "...",
      "new_content": "..."
    }
  ],
  "explanation": "Brief explanation of the fix",
  "confidence": 0.9
}

Respond ONLY with valid JSON, no other text."#;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Settings for completion requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixGeneratorConfig {
    /// Model identifier passed to the completion backend.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for FixGeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn missing_import_prompt(missing_module: &str, file_path: &str, file_content: &str) -> String {
    format!(
        "You are a Python code expert. A CI test failed with a ModuleNotFoundError.\n\
         \n\
         Error: Missing module '{missing_module}'\n\
         File: {file_path}\n\
         \n\
         Current file content:\n\
         ```python\n\
         {file_content}\n\
         ```\n\
         \n\
         Task: Generate the MINIMAL fix to resolve this import error.\n\
         - If the module should be imported, add the import statement\n\
         - If it's a typo, fix the import name\n\
         - If it's a missing package, indicate that in requirements.txt\n\
         \n\
         {RESPONSE_CONTRACT}"
    )
}

fn broken_path_prompt(missing_path: &str, file_path: &str, file_content: &str) -> String {
    format!(
        "You are a Python code expert. A file path error occurred.\n\
         \n\
         Error: File not found '{missing_path}'\n\
         File: {file_path}\n\
         \n\
         File content with the broken path:\n\
         ```python\n\
         {file_content}\n\
         ```\n\
         \n\
         Task: Suggest the correct path or identify what file needs to be created.\n\
         \n\
         {RESPONSE_CONTRACT}"
    )
}

fn generic_prompt(
    category: FailureCategory,
    details: &BTreeMap<String, String>,
    file_path: &str,
    file_content: &str,
) -> String {
    let details_json = serde_json::to_string(details).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Analyze this CI failure and suggest a minimal fix.\n\
         \n\
         Failure Type: {category}\n\
         Error Details: {details_json}\n\
         File: {file_path}\n\
         \n\
         File content:\n\
         ```python\n\
         {file_content}\n\
         ```\n\
         \n\
         Provide a minimal, surgical fix.\n\
         \n\
         {RESPONSE_CONTRACT}"
    )
}

fn detail_value<'a>(details: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    details.get(key).map(String::as_str).unwrap_or_default()
}

/// Templated fix appending the missing package to `requirements.txt`.
pub fn missing_dependency_fix(package_name: &str) -> FixProposal {
    FixProposal {
        fix_type: FixType::AddDependency,
        changes: vec![ChangeOp::insert(
            REQUIREMENTS_FILE,
            APPEND_LINE,
            format!("{package_name}\n"),
        )],
        explanation: format!("Add missing dependency '{package_name}' to {REQUIREMENTS_FILE}"),
        confidence: DEPENDENCY_FIX_CONFIDENCE,
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Maps diagnoses to fix proposals.
#[derive(Clone)]
pub struct FixGenerator {
    completion: Arc<dyn CompletionService>,
    config: FixGeneratorConfig,
}

impl FixGenerator {
    pub fn new(completion: Arc<dyn CompletionService>, config: FixGeneratorConfig) -> Self {
        Self { completion, config }
    }

    pub fn config(&self) -> &FixGeneratorConfig {
        &self.config
    }

    /// Generate a fix for a diagnosed failure.
    ///
    /// Never fails for a well-formed diagnosis on its own; errors come only
    /// from the completion backend (transport) or its output (malformed).
    pub async fn generate_fix(
        &self,
        category: FailureCategory,
        details: &BTreeMap<String, String>,
        file_content: &str,
        file_path: &str,
    ) -> Result<FixProposal> {
        match category {
            FailureCategory::ModuleNotFound => {
                let missing_module = detail_value(details, "missing_module");
                let prompt = missing_import_prompt(missing_module, file_path, file_content);
                self.request_fix(&prompt, Some(JSON_ONLY_SYSTEM_PROMPT)).await
            }
            FailureCategory::MissingDependency => {
                Ok(missing_dependency_fix(detail_value(details, "package_name")))
            }
            FailureCategory::BrokenPath => {
                let missing_path = detail_value(details, "missing_path");
                let prompt = broken_path_prompt(missing_path, file_path, file_content);
                self.request_fix(&prompt, None).await
            }
            FailureCategory::ImportError
            | FailureCategory::SyntaxError
            | FailureCategory::Unknown => {
                let prompt = generic_prompt(category, details, file_path, file_content);
                self.request_fix(&prompt, None).await
            }
        }
    }

    async fn request_fix(&self, prompt: &str, system_prompt: Option<&str>) -> Result<FixProposal> {
        let options = CompletionOptions {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            system_prompt: system_prompt.map(str::to_string),
        };

        debug!(model = %options.model, prompt_chars = prompt.len(), "requesting fix completion");
        let response = self.completion.complete(prompt, &options).await?;
        parse_fix_response(&response)
    }
}
