//! Comment submission with post-action verification.
//!
//! A dispatch is never trusted on its own: the submitted text must become
//! visible under the post before the outcome counts as `Posted`. Once the
//! click is dispatched, any ambiguity resolves to `Unconfirmed`, never to
//! `Posted`.

use chrono::Utc;
use tracing::{info, warn};

use crate::adapters::{CommentSurface, SubmissionError};
use crate::domain::{CommentDraft, FailureKind, PostRecord, SubmissionResult, SubmissionStatus};

/// Submit `draft` on `post` via the automation surface.
///
/// Called at most once per engage decision; the controller enforces that.
pub async fn submit<S: CommentSurface + ?Sized>(
    surface: &mut S,
    post: &PostRecord,
    draft: &CommentDraft,
) -> SubmissionResult {
    let status = match surface.click_comment(&post.post_ref, &draft.text).await {
        Err(SubmissionError::Rejected(reason)) => {
            warn!(post_id = %post.post_id, %reason, "submission rejected");
            SubmissionStatus::Failed(FailureKind::Rejected)
        }
        Err(SubmissionError::Unconfirmed(reason)) => {
            warn!(post_id = %post.post_id, %reason, "submission unconfirmed at dispatch");
            SubmissionStatus::Failed(FailureKind::Unconfirmed)
        }
        Ok(()) => match surface.comment_visible(&post.post_ref, &draft.text).await {
            Ok(true) => {
                info!(post_id = %post.post_id, "comment posted and confirmed");
                SubmissionStatus::Posted
            }
            Ok(false) => {
                warn!(post_id = %post.post_id, "comment dispatched but not visible");
                SubmissionStatus::Failed(FailureKind::Unconfirmed)
            }
            // The click went out; a failed verification read leaves the
            // outcome unknown, not failed-rejected.
            Err(e) => {
                warn!(post_id = %post.post_id, error = %e, "verification failed");
                SubmissionStatus::Failed(FailureKind::Unconfirmed)
            }
        },
    };

    SubmissionResult {
        post_id: post.post_id.clone(),
        status,
        submitted_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::script::{ScriptedOutcome, ScriptedSurface};
    use crate::domain::post::{extract, RawElement};

    fn post(id: &str) -> PostRecord {
        extract(&RawElement {
            source_id: Some(id.to_string()),
            author: Some("Ada".to_string()),
            description: Some("a post".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn draft(post_id: &str) -> CommentDraft {
        CommentDraft::new(post_id, "Nice one!", 1, 500)
    }

    #[tokio::test]
    async fn test_confirmed_submission_is_posted() {
        let mut surface = ScriptedSurface::from_pages(vec![]);
        let result = submit(&mut surface, &post("p1"), &draft("p1")).await;

        assert_eq!(result.status, SubmissionStatus::Posted);
        assert_eq!(surface.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_maps_to_failed_rejected() {
        let mut surface =
            ScriptedSurface::from_pages(vec![]).with_outcome("p1", ScriptedOutcome::Reject);
        let result = submit(&mut surface, &post("p1"), &draft("p1")).await;

        assert_eq!(
            result.status,
            SubmissionStatus::Failed(FailureKind::Rejected)
        );
    }

    #[tokio::test]
    async fn test_invisible_comment_maps_to_unconfirmed() {
        let mut surface =
            ScriptedSurface::from_pages(vec![]).with_outcome("p1", ScriptedOutcome::Unconfirmed);
        let result = submit(&mut surface, &post("p1"), &draft("p1")).await;

        assert_eq!(
            result.status,
            SubmissionStatus::Failed(FailureKind::Unconfirmed)
        );
    }
}
