use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::Result;
use crate::http::ForumClient;
use crate::listing::CommentRef;
use crate::session::Session;

// Substring markers classifying a deletion response body. These are the only
// coupling to the forum's markup; a remote change lands here and nowhere
// else.
const META_REFRESH_MARKER: &str = "<meta";
const ALERT_OPEN: &str = "alert('";
const ALERT_CLOSE: &str = "');";
const REPLIED_COMMENT_MARKER: &str = "답글 작성된 댓글은 삭제할 수 없습니다";

const ARTICLE_REMOVED_REASON: &str = "article was removed";

/// Classified outcome of one deletion attempt. At most one of the flags is
/// set; all false with a `fail_reason` means a plain business rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub success: bool,
    pub rate_limited: bool,
    pub must_edit: bool,
    pub article_removed: bool,
    pub fail_reason: Option<String>,
}

/// Attempt to delete one comment and classify the response.
///
/// Never retries and never errors on a non-2xx status; backoff and fallback
/// belong to the caller.
pub async fn remove_comment(
    client: &ForumClient,
    session: &Session,
    comment: &CommentRef,
) -> Result<(DeleteOutcome, Session)> {
    let article_view = format!("bbs/{}/views/{}", comment.board, comment.article_id);
    let path = format!("{article_view}/delete/{}", comment.comment_id);
    debug!(
        board = %comment.board,
        article = %comment.article_id,
        comment = %comment.comment_id,
        title = comment.title.as_deref().unwrap_or(""),
        "deleting comment"
    );

    let response = client.get(&path, Some(&article_view), session).await?;
    let outcome = classify_delete(response.status, &response.body);
    if outcome == DeleteOutcome::default() && response.status != StatusCode::OK {
        warn!(
            status = %response.status,
            comment = %comment.comment_id,
            "unexpected deletion response"
        );
    }

    Ok((outcome, session.merge(&response.cookies)))
}

/// Classify a deletion response from its transport status and body alone.
pub fn classify_delete(status: StatusCode, body: &str) -> DeleteOutcome {
    if status.is_redirection() {
        return DeleteOutcome {
            success: true,
            ..DeleteOutcome::default()
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return DeleteOutcome {
            rate_limited: true,
            ..DeleteOutcome::default()
        };
    }
    if status == StatusCode::OK {
        // A deleted article answers with a meta-refresh page instead of an
        // alert snippet.
        if body.contains(META_REFRESH_MARKER) {
            return DeleteOutcome {
                article_removed: true,
                fail_reason: Some(ARTICLE_REMOVED_REASON.to_string()),
                ..DeleteOutcome::default()
            };
        }
        let reason = extract_alert_text(body);
        let must_edit = reason.is_some_and(|text| text.contains(REPLIED_COMMENT_MARKER));
        return DeleteOutcome {
            must_edit,
            fail_reason: reason.map(str::to_string),
            ..DeleteOutcome::default()
        };
    }
    DeleteOutcome::default()
}

/// The message inside the response's `alert('...');` snippet, if present.
fn extract_alert_text(body: &str) -> Option<&str> {
    let start = body.find(ALERT_OPEN)? + ALERT_OPEN.len();
    let end = body[start..].find(ALERT_CLOSE)? + start;
    Some(&body[start..end])
}
