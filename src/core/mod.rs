//! Pipeline core: audit log, dedup index, policy, generation, submission,
//! and the controller that drives them.

pub mod audit;
pub mod controller;
pub mod dedup;
pub mod generator;
pub mod policy;
pub mod retry;
pub mod submitter;

pub use audit::{AuditError, AuditLog};
pub use controller::{CancelFlag, PipelineController, RunConfig};
pub use dedup::{DedupStore, SeenKind};
pub use generator::CommentGenerator;
pub use policy::{EngagementPolicy, Verdict};
pub use retry::{ErrorClass, RetryPolicy, RetryStep};
pub use submitter::submit;
