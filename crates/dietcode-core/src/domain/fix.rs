//! Fix proposal and change operation types.

use serde::{Deserialize, Serialize};

/// Line number meaning "append at end of file".
pub const APPEND_LINE: i64 = -1;

/// Kind of edit a [`ChangeOp`] performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Only `new_content` is meaningful.
    Insert,
    /// Both `old_content` and `new_content` are meaningful.
    Replace,
    /// Only `old_content` is meaningful.
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Insert => "insert",
            ChangeAction::Replace => "replace",
            ChangeAction::Delete => "delete",
        }
    }

    /// Parse a lowercase action tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "insert" => Some(ChangeAction::Insert),
            "replace" => Some(ChangeAction::Replace),
            "delete" => Some(ChangeAction::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single proposed edit to one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeOp {
    /// Path to the file being changed (relative to repository root).
    pub file: String,

    /// Edit kind.
    pub action: ChangeAction,

    /// 1-indexed target line; [`APPEND_LINE`] appends.
    pub line_number: Option<i64>,

    /// Content being replaced or deleted.
    pub old_content: String,

    /// Content being inserted or substituted.
    pub new_content: String,
}

impl ChangeOp {
    /// Insert `new_content` at `line_number`.
    pub fn insert(file: impl Into<String>, line_number: i64, new_content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            action: ChangeAction::Insert,
            line_number: Some(line_number),
            old_content: String::new(),
            new_content: new_content.into(),
        }
    }

    /// Replace `old_content` with `new_content`.
    #[cfg(test)]
    pub(crate) fn replace(
        file: impl Into<String>,
        line_number: Option<i64>,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            action: ChangeAction::Replace,
            line_number,
            old_content: old_content.into(),
            new_content: new_content.into(),
        }
    }

    /// Delete `old_content`.
    #[cfg(test)]
    pub(crate) fn delete(
        file: impl Into<String>,
        line_number: Option<i64>,
        old_content: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            action: ChangeAction::Delete,
            line_number,
            old_content: old_content.into(),
            new_content: String::new(),
        }
    }
}

/// Tag describing what a fix does.
///
/// Unknown tags returned by the completion backend are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FixType {
    AddImport,
    FixImport,
    AddDependency,
    FixPath,
    CreateFile,
    Other(String),
}

impl FixType {
    pub fn as_str(&self) -> &str {
        match self {
            FixType::AddImport => "add_import",
            FixType::FixImport => "fix_import",
            FixType::AddDependency => "add_dependency",
            FixType::FixPath => "fix_path",
            FixType::CreateFile => "create_file",
            FixType::Other(tag) => tag,
        }
    }
}

impl From<String> for FixType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "add_import" => FixType::AddImport,
            "fix_import" => FixType::FixImport,
            "add_dependency" => FixType::AddDependency,
            "fix_path" => FixType::FixPath,
            "create_file" => FixType::CreateFile,
            _ => FixType::Other(tag),
        }
    }
}

impl From<FixType> for String {
    fn from(fix_type: FixType) -> Self {
        fix_type.as_str().to_string()
    }
}

impl std::fmt::Display for FixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed fix for one diagnosed failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixProposal {
    pub fix_type: FixType,

    /// Ordered edits.
    pub changes: Vec<ChangeOp>,

    /// Human-readable description of the fix.
    pub explanation: String,

    /// Trust score in `[0, 1]`. Displayed, never gated on.
    pub confidence: f64,
}
