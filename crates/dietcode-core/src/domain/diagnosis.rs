//! Structured diagnosis produced from raw CI log text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::category::FailureCategory;

/// Confidence assigned when a known error pattern matched.
pub const MATCHED_CONFIDENCE: f64 = 0.9;

/// Confidence assigned when error lines exist but no pattern matched.
pub const UNRECOGNIZED_CONFIDENCE: f64 = 0.3;

/// Result of analysing one CI log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    /// Failure category.
    pub category: FailureCategory,

    /// Whole text matched by the winning pattern; empty when nothing matched.
    pub error_message: String,

    /// Category-specific parameters (`missing_module`, `missing_path`,
    /// `package_name`).
    pub details: BTreeMap<String, String>,

    /// Heuristic trust score in `[0, 1]`.
    pub confidence: f64,

    /// Up to ten lines of context around error keywords.
    pub log_snippet: String,
}

impl Diagnosis {
    /// Diagnosis for a log with no error lines at all.
    pub fn empty() -> Self {
        Self {
            category: FailureCategory::Unknown,
            error_message: String::new(),
            details: BTreeMap::new(),
            confidence: 0.0,
            log_snippet: String::new(),
        }
    }

    /// Diagnosis for a log with error lines that matched no known pattern.
    pub fn unrecognized(log_snippet: String) -> Self {
        Self {
            confidence: UNRECOGNIZED_CONFIDENCE,
            log_snippet,
            ..Self::empty()
        }
    }

    /// Diagnosis for a matched pattern.
    pub fn matched(category: FailureCategory, error_message: String, log_snippet: String) -> Self {
        Self {
            category,
            error_message,
            details: BTreeMap::new(),
            confidence: MATCHED_CONFIDENCE,
            log_snippet,
        }
    }

    /// Attach an extracted parameter.
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Look up an extracted parameter.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }
}
