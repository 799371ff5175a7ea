//! Validation of fix proposals returned by the completion backend.
//!
//! Completion text is untrusted. It is parsed into a loose
//! [`serde_json::Value`], checked field by field, and only then converted into
//! a [`FixProposal`]. Any shape mismatch is a
//! [`DietCodeError::MalformedResponse`].

use serde_json::{Map, Value};

use crate::domain::{ChangeAction, ChangeOp, DietCodeError, FixProposal, FixType, Result};

/// Maximum number of response characters quoted in an error message.
const PREVIEW_CHARS: usize = 200;

/// Strip a surrounding markdown code fence, if any.
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

/// Narrow the text to the outermost `{ ... }` object.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str, context: &str) -> Result<&'a str> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(DietCodeError::malformed(format!(
            "{context}: field `{field}` must be a string, got {other}"
        ))),
        None => Err(DietCodeError::malformed(format!(
            "{context}: missing field `{field}`"
        ))),
    }
}

fn optional_str(obj: &Map<String, Value>, field: &str, context: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DietCodeError::malformed(format!(
            "{context}: field `{field}` must be a string, got {other}"
        ))),
    }
}

fn parse_change(index: usize, value: &Value) -> Result<ChangeOp> {
    let context = format!("changes[{index}]");
    let obj = value
        .as_object()
        .ok_or_else(|| DietCodeError::malformed(format!("{context}: expected an object")))?;

    let file = required_str(obj, "file", &context)?.to_string();
    let action_tag = required_str(obj, "action", &context)?;
    let action = ChangeAction::parse(action_tag).ok_or_else(|| {
        DietCodeError::malformed(format!("{context}: unknown action `{action_tag}`"))
    })?;

    let line_number = match obj.get("line_number") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_i64().ok_or_else(|| {
            DietCodeError::malformed(format!("{context}: `line_number` must be an integer"))
        })?),
    };

    let old_content = optional_str(obj, "old_content", &context)?;
    let new_content = optional_str(obj, "new_content", &context)?;

    let needs_old = matches!(action, ChangeAction::Replace | ChangeAction::Delete);
    let needs_new = matches!(action, ChangeAction::Replace | ChangeAction::Insert);
    if needs_old && old_content.is_none() {
        return Err(DietCodeError::malformed(format!(
            "{context}: `{action}` requires `old_content`"
        )));
    }
    if needs_new && new_content.is_none() {
        return Err(DietCodeError::malformed(format!(
            "{context}: `{action}` requires `new_content`"
        )));
    }

    Ok(ChangeOp {
        file,
        action,
        line_number,
        old_content: old_content.unwrap_or_default(),
        new_content: new_content.unwrap_or_default(),
    })
}

/// Validate an already-decoded JSON value as a fix proposal.
pub fn fix_from_value(value: &Value) -> Result<FixProposal> {
    let obj = value
        .as_object()
        .ok_or_else(|| DietCodeError::malformed("expected a JSON object"))?;

    let fix_type = FixType::from(required_str(obj, "fix_type", "fix")?.to_string());

    let changes = match obj.get("changes") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| parse_change(i, v))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(DietCodeError::malformed("fix: `changes` must be an array")),
        None => return Err(DietCodeError::malformed("fix: missing field `changes`")),
    };

    let explanation = required_str(obj, "explanation", "fix")?.to_string();

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| DietCodeError::malformed("fix: `confidence` must be a number"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(DietCodeError::malformed(format!(
            "fix: `confidence` {confidence} is outside [0, 1]"
        )));
    }

    Ok(FixProposal {
        fix_type,
        changes,
        explanation,
        confidence,
    })
}

/// Parse raw completion text into a validated fix proposal.
///
/// Tolerates surrounding markdown fences and prose around a single JSON
/// object; everything else about the shape is checked strictly.
pub fn parse_fix_response(response: &str) -> Result<FixProposal> {
    let clean = strip_markdown_fences(response);
    let json = extract_json_object(clean).ok_or_else(|| {
        DietCodeError::malformed(format!(
            "no JSON object in response: {}",
            preview(response)
        ))
    })?;

    let value: Value = serde_json::from_str(json).map_err(|e| {
        DietCodeError::malformed(format!("invalid JSON ({e}): {}", preview(json)))
    })?;

    fix_from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "fix_type": "add_import",
        "changes": [
            {
                "file": "app/api.py",
                "action": "insert",
                "line_number": 1,
                "old_content": "",
                "new_content": "import requests"
            }
        ],
        "explanation": "Import the requests module",
        "confidence": 0.9
    }"#;

    #[test]
    fn test_parse_valid_response() {
        let fix = parse_fix_response(VALID).expect("valid fix");
        assert_eq!(fix.fix_type, FixType::AddImport);
        assert_eq!(fix.changes.len(), 1);
        assert_eq!(fix.changes[0].file, "app/api.py");
        assert_eq!(fix.changes[0].action, ChangeAction::Insert);
        assert_eq!(fix.changes[0].line_number, Some(1));
        assert_eq!(fix.changes[0].new_content, "import requests");
        assert_eq!(fix.confidence, 0.9);
    }

    #[test]
    fn test_parse_fenced_response_with_prose() {
        let text = format!("Here is the fix:\n```json\n{VALID}\n```\n");
        let fix = parse_fix_response(&text).expect("fenced fix");
        assert_eq!(fix.explanation, "Import the requests module");
    }

    #[test]
    fn test_null_line_number_and_missing_old_content_for_insert() {
        let text = r#"{"fix_type":"create_file","changes":[{"file":"config/settings.json","action":"insert","line_number":null,"new_content":"{}"}],"explanation":"Create it","confidence":0.5}"#;
        let fix = parse_fix_response(text).expect("valid fix");
        assert_eq!(fix.fix_type, FixType::CreateFile);
        assert_eq!(fix.changes[0].line_number, None);
        assert_eq!(fix.changes[0].old_content, "");
    }

    #[test]
    fn test_unknown_fix_type_is_preserved() {
        let text = r#"{"fix_type":"rename_module","changes":[],"explanation":"x","confidence":0.4}"#;
        let fix = parse_fix_response(text).expect("valid fix");
        assert_eq!(fix.fix_type, FixType::Other("rename_module".to_string()));
        assert!(fix.changes.is_empty());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_fix_response("I cannot help with that.").unwrap_err();
        assert!(matches!(err, DietCodeError::MalformedResponse(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_fix_response("{\"fix_type\": \"add_import\",}").unwrap_err();
        assert!(matches!(err, DietCodeError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_changes_is_malformed() {
        let err = parse_fix_response(r#"{"fix_type":"fix_path","explanation":"x","confidence":0.8}"#)
            .unwrap_err();
        assert!(err.to_string().contains("changes"));
    }

    #[test]
    fn test_changes_not_array_is_malformed() {
        let err = parse_fix_response(
            r#"{"fix_type":"fix_path","changes":"none","explanation":"x","confidence":0.8}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_unknown_action_is_malformed() {
        let text = r#"{"fix_type":"fix_path","changes":[{"file":"a.py","action":"move","new_content":"x"}],"explanation":"x","confidence":0.8}"#;
        let err = parse_fix_response(text).unwrap_err();
        assert!(err.to_string().contains("unknown action `move`"));
    }

    #[test]
    fn test_replace_requires_both_contents() {
        let text = r#"{"fix_type":"fix_path","changes":[{"file":"a.py","action":"replace","new_content":"x"}],"explanation":"x","confidence":0.8}"#;
        let err = parse_fix_response(text).unwrap_err();
        assert!(err.to_string().contains("requires `old_content`"));
    }

    #[test]
    fn test_delete_requires_old_content() {
        let text = r#"{"fix_type":"fix_import","changes":[{"file":"a.py","action":"delete"}],"explanation":"x","confidence":0.8}"#;
        let err = parse_fix_response(text).unwrap_err();
        assert!(err.to_string().contains("requires `old_content`"));
    }

    #[test]
    fn test_confidence_out_of_range_is_malformed() {
        let text = r#"{"fix_type":"fix_path","changes":[],"explanation":"x","confidence":90}"#;
        let err = parse_fix_response(text).unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));
    }

    #[test]
    fn test_string_line_number_is_malformed() {
        let text = r#"{"fix_type":"fix_path","changes":[{"file":"a.py","action":"insert","line_number":"5","new_content":"x"}],"explanation":"x","confidence":0.8}"#;
        let err = parse_fix_response(text).unwrap_err();
        assert!(err.to_string().contains("line_number"));
    }
}
