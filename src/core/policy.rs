//! Engagement policy: skip, engage, or end the run.
//!
//! Posts are evaluated strictly in feed-native order; the policy is a pure
//! function of the post, the run state, and the dedup index, so a run's
//! decisions are reproducible from its inputs.

use tracing::debug;

use super::dedup::{DedupStore, SeenKind};
use crate::domain::{EngagementDecision, PostRecord, RunState, SkipReason};

/// Outcome of evaluating one post against the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A per-post decision; the run continues
    Decision(EngagementDecision),

    /// The budget is spent: stop fetching posts, no decision for this one
    EndOfBudget,
}

/// Decides, per post, whether to engage
#[derive(Debug, Clone)]
pub struct EngagementPolicy {
    min_description_chars: usize,
}

impl EngagementPolicy {
    pub fn new(min_description_chars: usize) -> Self {
        Self {
            min_description_chars,
        }
    }

    /// Evaluate one post. Order of checks matters: budget first (the run
    /// must stop before this post is even decided), then identity, then
    /// content.
    pub fn decide(&self, post: &PostRecord, run: &RunState, dedup: &DedupStore) -> Verdict {
        if run.budget_exhausted() {
            return Verdict::EndOfBudget;
        }

        if let Some(kind) = dedup.seen(&post.post_id) {
            let reason = match kind {
                SeenKind::Engaged => SkipReason::AlreadyEngaged,
                SeenKind::Evaluated => SkipReason::Duplicate,
            };
            debug!(post_id = %post.post_id, ?reason, "skipping known post");
            return Verdict::Decision(EngagementDecision::Skip(reason));
        }

        let content_chars = post.description.trim().chars().count();
        if content_chars < self.min_description_chars.max(1) {
            debug!(post_id = %post.post_id, content_chars, "skipping thin post");
            return Verdict::Decision(EngagementDecision::Skip(SkipReason::InsufficientContent));
        }

        Verdict::Decision(EngagementDecision::Engage)
    }
}
