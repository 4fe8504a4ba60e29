//! Domain types for the engagement pipeline.

pub mod draft;
pub mod engagement;
pub mod post;
pub mod run;

pub use draft::{truncate_comment, CommentDraft};
pub use engagement::{
    AuditEntry, EngagementDecision, FailureKind, SkipReason, SubmissionResult, SubmissionStatus,
};
pub use post::{extract, ExtractionError, PostRecord, PostRef, RawElement};
pub use run::{RunState, RunSummary, TerminationReason};
