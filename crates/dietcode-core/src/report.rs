//! Pull request comment rendering.
//!
//! The rendered markdown is the one bit-exact artifact the pipeline
//! publishes; `render_fix_comment` output is covered by a golden test.

use sha2::{Digest, Sha256};

use crate::domain::{ChangeAction, ChangeOp, Diagnosis, FixProposal};

/// Format a `[0, 1]` score as a whole percentage (`0.85` -> `85%`).
fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// One summary bullet per change: `- **<file>** (line <n>): <action>`.
pub fn render_change_summary(changes: &[ChangeOp]) -> String {
    changes
        .iter()
        .map(|c| {
            let line = c
                .line_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!("- **{}** (line {}): {}", c.file, line, c.action)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line-prefixed diff view: `+ new` for added content, `- old` for removed.
pub fn render_changes_detail(changes: &[ChangeOp]) -> String {
    let mut lines = Vec::new();
    for change in changes {
        match change.action {
            ChangeAction::Insert => lines.push(format!("+ {}", change.new_content)),
            ChangeAction::Replace => {
                lines.push(format!("- {}", change.old_content));
                lines.push(format!("+ {}", change.new_content));
            }
            ChangeAction::Delete => lines.push(format!("- {}", change.old_content)),
        }
    }
    lines.join("\n")
}

/// Render the fix suggestion comment posted on the pull request.
pub fn render_fix_comment(diagnosis: &Diagnosis, fix: &FixProposal, check_name: &str) -> String {
    let mut out = String::new();
    out.push_str("## 🤖 DietCode CI Fix Suggestion\n\n");
    out.push_str(&format!("**CI Check Failed:** `{}`\n\n", check_name));

    out.push_str("### 📊 Diagnosis\n");
    out.push_str(&format!(
        "- **Failure Type:** `{}`\n- **Error:** `{}`\n- **Confidence:** {}\n\n",
        diagnosis.category,
        diagnosis.error_message,
        percent(diagnosis.confidence)
    ));

    out.push_str("### 🔧 Proposed Fix\n");
    out.push_str(&format!("{}\n\n", fix.explanation));
    out.push_str("**Changes:**\n");
    out.push_str(&format!("{}\n\n", render_change_summary(&fix.changes)));
    out.push_str(&format!("**Fix Confidence:** {}\n\n", percent(fix.confidence)));

    out.push_str("### ✅ Approval\n");
    out.push_str("To apply this fix, reply with: `/dietcode apply`\n");
    out.push_str("To reject this fix, reply with: `/dietcode reject`\n\n");

    out.push_str("---\n<details>\n<summary>View detailed changes</summary>\n```python\n");
    out.push_str(&format!("{}\n", render_changes_detail(&fix.changes)));
    out.push_str("```\n</details>\n\n");
    out.push_str(
        "*This is an automated fix generated by DietCode. Please review carefully before applying.*\n",
    );
    out
}

/// SHA-256 hex digest of a comment body, logged for correlation.
pub fn comment_digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}
