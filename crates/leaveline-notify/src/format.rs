//! Pure message rendering — no I/O, deterministic for identical input.

use crate::types::StatusChange;

/// Render a status transition into the human-readable notification body.
///
/// Total for all inputs; empty fields produce an awkward sentence but
/// never a panic. Callers wanting a guaranteed-sensible message should
/// populate at least the applicant name and leave type.
pub fn status_change_body(change: &StatusChange) -> String {
    let mut body = format!(
        "Leave request update for {}\n\nYour {} leave from {} to {} has been {} by {}.",
        change.applicant_name,
        change.leave_type,
        change.date_start.format("%Y-%m-%d"),
        change.date_end.format("%Y-%m-%d"),
        change.status,
        change.reviewer_name,
    );

    let comments = change.comments.trim();
    if !comments.is_empty() {
        body.push_str("\nReviewer comments: ");
        body.push_str(comments);
    }

    body
}
