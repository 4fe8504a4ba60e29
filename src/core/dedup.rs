//! Deduplication store: which post identities are already accounted for.
//!
//! The store is an in-memory index rebuilt deterministically from the audit
//! log at startup. It never persists anything itself; the audit log is the
//! single durable source of truth.

use std::collections::HashMap;

use crate::domain::{AuditEntry, FailureKind, SubmissionStatus};

/// How a post identity became known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenKind {
    /// A comment was posted (or visibly refused); engagement is final
    Engaged,

    /// Evaluated before, without a final engagement
    Evaluated,
}

/// In-memory seen-index over post identities.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupStore {
    seen: HashMap<String, SeenKind>,
    skip_counts: HashMap<String, u32>,
    skip_replay_limit: Option<u32>,
}

impl DedupStore {
    /// Empty store; `skip_replay_limit` is the number of prior skip
    /// evaluations after which a post stops being re-evaluated
    /// (`None` = unlimited re-evaluation).
    pub fn new(skip_replay_limit: Option<u32>) -> Self {
        Self {
            seen: HashMap::new(),
            skip_counts: HashMap::new(),
            skip_replay_limit,
        }
    }

    /// Rebuild the index from replayed audit entries.
    ///
    /// Deterministic: rebuilding twice from the same entries yields the
    /// same store.
    pub fn rebuild(entries: &[AuditEntry], skip_replay_limit: Option<u32>) -> Self {
        let mut store = Self::new(skip_replay_limit);
        for entry in entries {
            store.absorb(entry);
        }
        // Counting is only meaningful during replay.
        store.skip_counts.clear();
        store
    }

    fn absorb(&mut self, entry: &AuditEntry) {
        match &entry.result {
            SubmissionStatus::Posted => {
                self.seen.insert(entry.post_id.clone(), SeenKind::Engaged);
            }
            // A visibly-refused action is never retried: re-clicking it is
            // exactly the duplicate-posting risk this store exists to avoid.
            SubmissionStatus::Failed(FailureKind::Rejected) => {
                self.seen
                    .entry(entry.post_id.clone())
                    .or_insert(SeenKind::Evaluated);
            }
            // Unconfirmed outcomes stay eligible for a future run: it is
            // genuinely unknown whether the action succeeded.
            SubmissionStatus::Failed(FailureKind::Unconfirmed) => {}
            SubmissionStatus::Skipped(_) => {
                if let Some(limit) = self.skip_replay_limit {
                    let count = self.skip_counts.entry(entry.post_id.clone()).or_insert(0);
                    *count += 1;
                    if *count > limit {
                        self.seen
                            .entry(entry.post_id.clone())
                            .or_insert(SeenKind::Evaluated);
                    }
                }
            }
        }
    }

    /// Whether (and how) this post identity is already accounted for
    pub fn seen(&self, post_id: &str) -> Option<SeenKind> {
        self.seen.get(post_id).copied()
    }

    /// Mark a post identity as seen for the rest of this run.
    ///
    /// Never downgrades an `Engaged` mark to `Evaluated`.
    pub fn record(&mut self, post_id: &str, kind: SeenKind) {
        match kind {
            SeenKind::Engaged => {
                self.seen.insert(post_id.to_string(), kind);
            }
            SeenKind::Evaluated => {
                self.seen.entry(post_id.to_string()).or_insert(kind);
            }
        }
    }

    /// Number of known post identities
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
