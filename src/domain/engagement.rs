//! Decisions, submission outcomes, and the audit record.
//!
//! Every evaluated post ends in exactly one [`AuditEntry`]. The concatenation
//! of entries across runs is the durable source of truth for deduplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The policy's verdict for one post, produced exactly once per post per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum EngagementDecision {
    /// Generate and submit a comment
    Engage,

    /// Leave the post alone
    Skip(SkipReason),
}

/// Why a post was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A prior run already posted a comment here
    AlreadyEngaged,

    /// Already evaluated, in this run or a prior one
    Duplicate,

    /// Description empty or below the configured minimum length
    InsufficientContent,

    /// Draft generation failed permanently or exhausted its retries
    GenerationFailed,
}

/// Terminal outcome of one evaluated post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum SubmissionStatus {
    /// Comment dispatched and confirmed visible
    Posted,

    /// Comment not posted (or not provably posted)
    Failed(FailureKind),

    /// No submission was attempted
    Skipped(SkipReason),
}

/// How a submission failed. The two kinds imply different recovery:
/// a rejected action is final, an unconfirmed one stays eligible for
/// re-evaluation in a future run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The platform visibly refused the action
    Rejected,

    /// The action was dispatched but never confirmed
    Unconfirmed,
}

/// Result of a single submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub post_id: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

/// One immutable line in the append-only audit log.
///
/// Entries are self-describing: no cross-entry references are needed to
/// interpret one, so a partial log remains usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// The run this entry belongs to
    pub run_id: Uuid,

    /// Identity of the evaluated post
    pub post_id: String,

    /// The decision the policy produced
    pub decision: EngagementDecision,

    /// The submitted (or generated-but-failed) comment text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_text: Option<String>,

    /// Terminal outcome for this post
    pub result: SubmissionStatus,

    /// When this entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Create a new entry with the current timestamp
    pub fn new(
        run_id: Uuid,
        post_id: impl Into<String>,
        decision: EngagementDecision,
        result: SubmissionStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            post_id: post_id.into(),
            decision,
            draft_text: None,
            result,
            timestamp: Utc::now(),
        }
    }

    /// Attach the draft text that was generated for this post
    pub fn with_draft(mut self, text: impl Into<String>) -> Self {
        self.draft_text = Some(text.into());
        self
    }

    /// Whether this entry records a confirmed posted comment
    pub fn is_posted(&self) -> bool {
        matches!(self.result, SubmissionStatus::Posted)
    }
}
