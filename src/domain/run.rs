//! Per-run state and the end-of-run summary.
//!
//! `RunState` lives only for the duration of one run and is mutated solely
//! by the pipeline controller; its effects persist via the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutable state for one engagement run.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// Confirmed posted comments so far
    pub engaged_count: u32,

    /// Posts that received a decision so far
    pub evaluated_count: u32,

    /// Maximum confirmed engagements allowed this run
    pub budget_limit: u32,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Set once a terminal condition is reached
    pub terminated: bool,

    /// Why the run ended
    pub termination_reason: Option<TerminationReason>,
}

impl RunState {
    /// Create state for a fresh run
    pub fn new(budget_limit: u32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            engaged_count: 0,
            evaluated_count: 0,
            budget_limit,
            started_at: Utc::now(),
            terminated: false,
            termination_reason: None,
        }
    }

    /// Whether no further engagements are allowed
    pub fn budget_exhausted(&self) -> bool {
        self.engaged_count >= self.budget_limit
    }

    /// Mark the run terminated; the first reason wins.
    pub fn terminate(&mut self, reason: TerminationReason) {
        if !self.terminated {
            self.terminated = true;
            self.termination_reason = Some(reason);
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum TerminationReason {
    /// The engagement budget was reached
    EndOfBudget,

    /// The feed signalled no more posts
    FeedExhausted,

    /// A cancellation request took effect at a post boundary
    Cancelled,

    /// The automation surface became unusable
    Fatal { error: String },
}

impl TerminationReason {
    /// Whether this reason should map to a non-zero process exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

/// Final accounting for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub posted: u32,
    pub skipped: u32,
    pub failed: u32,
    pub evaluated: u32,
    pub termination_reason: TerminationReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match &self.termination_reason {
            TerminationReason::EndOfBudget => "budget reached".to_string(),
            TerminationReason::FeedExhausted => "feed exhausted".to_string(),
            TerminationReason::Cancelled => "cancelled".to_string(),
            TerminationReason::Fatal { error } => format!("fatal: {}", error),
        };
        write!(
            f,
            "evaluated {} posts: {} posted, {} skipped, {} failed ({})",
            self.evaluated, self.posted, self.skipped, self.failed, reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_run_state() {
        let run = RunState::new(5);
        assert_eq!(run.engaged_count, 0);
        assert!(!run.terminated);
        assert!(!run.budget_exhausted());
    }

    #[test]
    fn test_zero_budget_is_exhausted_immediately() {
        let run = RunState::new(0);
        assert!(run.budget_exhausted());
    }

    #[test]
    fn test_first_termination_reason_wins() {
        let mut run = RunState::new(1);
        run.terminate(TerminationReason::EndOfBudget);
        run.terminate(TerminationReason::Cancelled);

        assert_eq!(
            run.termination_reason,
            Some(TerminationReason::EndOfBudget)
        );
    }

    #[test]
    fn test_summary_display_mentions_reason() {
        let summary = RunSummary {
            run_id: Uuid::new_v4(),
            posted: 2,
            skipped: 1,
            failed: 0,
            evaluated: 3,
            termination_reason: TerminationReason::FeedExhausted,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        assert!(summary.to_string().contains("feed exhausted"));
        assert!(summary.to_string().contains("2 posted"));
    }
}
