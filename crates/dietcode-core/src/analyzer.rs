//! CI log analyzer.
//!
//! Normalizes raw CI log text into a structured [`Diagnosis`]. Analysis is a
//! pure function of its input: no I/O, no hidden state, and it never fails.
//! A log it cannot classify yields an `Unknown` diagnosis with low confidence.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Diagnosis, FailureCategory};

/// Lowercase keywords that mark a line as an error line.
const ERROR_KEYWORDS: [&str; 5] = [
    "error",
    "failed",
    "exception",
    "traceback",
    "modulenotfounderror",
];

/// Context lines collected before a keyword line.
const CONTEXT_BEFORE: usize = 2;

/// Context lines collected from the keyword line onwards (inclusive).
const CONTEXT_AFTER: usize = 6;

/// Maximum number of lines kept in [`Diagnosis::log_snippet`].
pub const MAX_SNIPPET_LINES: usize = 10;

/// Category -> patterns, in match priority order.
const PATTERN_TABLE: &[(FailureCategory, &[&str])] = &[
    (
        FailureCategory::ModuleNotFound,
        &[
            r"ModuleNotFoundError: No module named '([^']+)'",
            r"ImportError: No module named ([^\s]+)",
            r"cannot import name '([^']+)'",
        ],
    ),
    (
        FailureCategory::ImportError,
        &[r"ImportError: (.+)", r"from ([^\s]+) import .+ failed"],
    ),
    (
        FailureCategory::MissingDependency,
        &[
            r"error: externally-managed-environment",
            r"Could not find a version that satisfies the requirement ([^\s]+)",
            r"No matching distribution found for ([^\s]+)",
        ],
    ),
    (
        FailureCategory::BrokenPath,
        &[
            r"FileNotFoundError: \[Errno 2\] No such file or directory: '([^']+)'",
            r"IOError: \[Errno 2\] No such file or directory: '([^']+)'",
        ],
    ),
    (
        FailureCategory::SyntaxError,
        &[r"SyntaxError: (.+)", r"IndentationError: (.+)"],
    ),
];

fn compiled_patterns() -> &'static [(FailureCategory, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(FailureCategory, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        PATTERN_TABLE
            .iter()
            .map(|(category, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(&format!("(?m){p}")).expect("built-in pattern is valid"))
                    .collect();
                (*category, compiled)
            })
            .collect()
    })
}

/// Collect context windows around every keyword line.
///
/// Windows are concatenated in line order without deduplication, so
/// overlapping windows repeat lines.
pub fn extract_error_lines(log: &str) -> Vec<&str> {
    let lines: Vec<&str> = log.split('\n').collect();
    let mut collected = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if ERROR_KEYWORDS.iter().any(|k| lower.contains(k)) {
            let start = i.saturating_sub(CONTEXT_BEFORE);
            let end = (i + CONTEXT_AFTER).min(lines.len());
            collected.extend_from_slice(&lines[start..end]);
        }
    }

    collected
}

/// Analyze a raw CI log.
///
/// Patterns are tried against the whole log, category by category in
/// declaration order; the first pattern that matches anywhere wins, even if
/// a later category matches earlier in the text.
pub fn analyze(log: &str) -> Diagnosis {
    let error_lines = extract_error_lines(log);
    if error_lines.is_empty() {
        return Diagnosis::empty();
    }

    let snippet = error_lines
        .iter()
        .take(MAX_SNIPPET_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    for (category, patterns) in compiled_patterns() {
        for pattern in patterns {
            let Some(caps) = pattern.captures(log) else {
                continue;
            };

            let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let mut diagnosis = Diagnosis::matched(*category, matched.to_string(), snippet);

            if let (Some(key), Some(group)) = (category.detail_key(), caps.get(1)) {
                diagnosis = diagnosis.with_detail(key, group.as_str());
            }

            tracing::debug!(
                category = %category,
                pattern = %pattern.as_str(),
                "log pattern matched"
            );
            return diagnosis;
        }
    }

    Diagnosis::unrecognized(snippet)
}
