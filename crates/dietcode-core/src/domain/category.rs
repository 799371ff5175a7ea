//! Failure categories recognised by the log analyzer.

use serde::{Deserialize, Serialize};

/// Closed set of CI failure categories.
///
/// Declaration order is significant: the analyzer tries categories in this
/// order and the first matching one wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    ModuleNotFound,
    ImportError,
    MissingDependency,
    BrokenPath,
    SyntaxError,
    Unknown,
}

impl FailureCategory {
    /// Stable snake_case tag, as used in reports and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::ModuleNotFound => "module_not_found",
            FailureCategory::ImportError => "import_error",
            FailureCategory::MissingDependency => "missing_dependency",
            FailureCategory::BrokenPath => "broken_path",
            FailureCategory::SyntaxError => "syntax_error",
            FailureCategory::Unknown => "unknown",
        }
    }

    /// Key under which the category's capture group is stored in
    /// [`crate::domain::Diagnosis::details`], if it has one.
    pub fn detail_key(&self) -> Option<&'static str> {
        match self {
            FailureCategory::ModuleNotFound => Some("missing_module"),
            FailureCategory::MissingDependency => Some("package_name"),
            FailureCategory::BrokenPath => Some("missing_path"),
            FailureCategory::ImportError
            | FailureCategory::SyntaxError
            | FailureCategory::Unknown => None,
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
