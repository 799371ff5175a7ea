//! Heuristics for finding the file a failure originates from.

use std::sync::OnceLock;

use regex::Regex;

fn diff_python_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+\+\+ b/(.+\.py)").expect("built-in pattern is valid"))
}

fn traceback_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"File "([^"]+\.py)""#).expect("built-in pattern is valid"))
}

/// Python files added or changed in a unified diff, in diff order.
pub fn python_files_in_diff(diff: &str) -> Vec<&str> {
    diff_python_file_re()
        .captures_iter(diff)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// First Python file referenced by a traceback frame (`File "<path>"`).
///
/// Leading `.` and `/` characters are stripped, so `./src/app.py` becomes
/// `src/app.py`.
pub fn traceback_file(snippet: &str) -> Option<String> {
    traceback_file_re()
        .captures(snippet)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches(['.', '/']).to_string())
}
