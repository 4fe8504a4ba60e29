//! feedpilot - Audited feed engagement pipeline
//!
//! Reads posts from a social feed, decides per post whether to engage,
//! generates a contextual reply comment, submits it, and records every
//! outcome in an append-only audit log.
//!
//! # Architecture
//!
//! The audit log is the single durable source of truth:
//! - Every evaluated post ends in exactly one audit log entry
//! - The dedup index is rebuilt by replaying the log at startup
//! - A post is never engaged twice, within a run or across runs
//!
//! # Modules
//!
//! - `adapters`: Collaborator integrations (feed surface, Gemini)
//! - `core`: Pipeline logic (AuditLog, DedupStore, PipelineController)
//! - `domain`: Data structures (PostRecord, CommentDraft, AuditEntry)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run one engagement pass over a captured feed
//! feedpilot run feed.jsonl --budget 5
//!
//! # Inspect recent outcomes
//! feedpilot history
//!
//! # Summarize the audit log
//! feedpilot status
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{AuditLog, DedupStore, PipelineController, RunConfig};
pub use crate::domain::{AuditEntry, CommentDraft, EngagementDecision, PostRecord, RunSummary};
