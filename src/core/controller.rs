//! Pipeline controller: the scan → decide → generate → submit → record loop.
//!
//! The controller exclusively owns the automation surface and the run state
//! for the run's lifetime. Per post the state machine is
//! extracted → evaluated → {skipped, drafted} → {posted, failed}, and every
//! evaluated post ends in exactly one audit entry, appended in
//! feed-extraction order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use super::audit::AuditLog;
use super::dedup::{DedupStore, SeenKind};
use super::generator::CommentGenerator;
use super::policy::{EngagementPolicy, Verdict};
use super::retry::RetryPolicy;
use super::submitter::submit;
use crate::adapters::{CommentSurface, FeedPage, FeedSource, LanguageModel};
use crate::domain::{
    extract, AuditEntry, EngagementDecision, PostRecord, RunState, RunSummary, SkipReason,
    SubmissionStatus, TerminationReason,
};

/// Runtime knobs for one engagement run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum confirmed engagements per run (> 0)
    pub budget_limit: u32,

    /// Minimum description length to consider engaging
    pub min_description_chars: usize,

    /// Platform comment length limit
    pub max_comment_chars: usize,

    /// Prior skip evaluations after which a post stops being re-evaluated
    pub skip_replay_limit: Option<u32>,

    /// Pause after each confirmed engagement
    pub engagement_delay: Duration,

    /// Retry policy for transient generation failures
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget_limit: 10,
            min_description_chars: 1,
            max_comment_chars: 1250,
            skip_replay_limit: None,
            engagement_delay: Duration::ZERO,
            retry: RetryPolicy::default(),
        }
    }
}

/// Cooperative cancellation, honored at post boundaries only — never
/// mid-submission.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run outcome tally
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    posted: u32,
    skipped: u32,
    failed: u32,
}

/// Drives posts through the engagement pipeline
pub struct PipelineController<S, M> {
    surface: S,
    generator: CommentGenerator<M>,
    policy: EngagementPolicy,
    audit: AuditLog,
    dedup: DedupStore,
    run: RunState,
    engagement_delay: Duration,
    cancel: CancelFlag,
    tally: Tally,
}

impl<S, M> PipelineController<S, M>
where
    S: FeedSource + CommentSurface,
    M: LanguageModel,
{
    /// Build a controller, rebuilding the dedup index from the audit log.
    pub async fn new(surface: S, model: M, audit: AuditLog, config: RunConfig) -> Result<Self> {
        let history = audit
            .replay()
            .await
            .context("failed to replay audit log")?;
        let dedup = DedupStore::rebuild(&history, config.skip_replay_limit);
        info!(
            history = history.len(),
            known_posts = dedup.len(),
            "dedup index rebuilt from audit log"
        );

        Ok(Self {
            surface,
            generator: CommentGenerator::new(model, config.retry.clone(), config.max_comment_chars),
            policy: EngagementPolicy::new(config.min_description_chars),
            audit,
            dedup,
            run: RunState::new(config.budget_limit),
            engagement_delay: config.engagement_delay,
            cancel: CancelFlag::new(),
            tally: Tally::default(),
        })
    }

    /// Install a cancellation flag checked at post boundaries
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The automation surface (for inspection after a run)
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Execute the run to one of its terminal conditions: budget spent,
    /// feed exhausted, cancellation, or a fatal surface failure. Per-post
    /// failures never end the run; fatal failures end it only after the
    /// current post's outcome is already in the audit log.
    #[instrument(skip(self), fields(run_id = %self.run.run_id))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!(budget = self.run.budget_limit, "starting engagement run");

        'feed: while !self.run.terminated {
            if self.cancel.is_cancelled() {
                self.run.terminate(TerminationReason::Cancelled);
                break;
            }

            let elements = match self.surface.next_page().await {
                Ok(FeedPage::Elements(elements)) => elements,
                Ok(FeedPage::EndOfFeed) => {
                    self.run.terminate(TerminationReason::FeedExhausted);
                    break;
                }
                Err(e) => {
                    error!(error = %e, "feed failure, aborting run");
                    self.run.terminate(TerminationReason::Fatal {
                        error: e.to_string(),
                    });
                    break;
                }
            };

            for element in &elements {
                if self.cancel.is_cancelled() {
                    self.run.terminate(TerminationReason::Cancelled);
                    break 'feed;
                }

                let post = match extract(element) {
                    Ok(post) => post,
                    Err(e) => {
                        warn!(error = %e, "dropping unextractable element");
                        continue;
                    }
                };

                match self.policy.decide(&post, &self.run, &self.dedup) {
                    Verdict::EndOfBudget => {
                        self.run.terminate(TerminationReason::EndOfBudget);
                        break 'feed;
                    }
                    Verdict::Decision(decision) => {
                        self.run.evaluated_count += 1;
                        // Mark seen before any generation or submission so a
                        // feed that repeats the post within this run cannot
                        // get a second decision for it.
                        self.dedup.record(&post.post_id, SeenKind::Evaluated);

                        match decision {
                            EngagementDecision::Skip(reason) => {
                                self.record_skip(&post, reason).await?;
                            }
                            EngagementDecision::Engage => {
                                self.engage(&post).await?;
                            }
                        }
                    }
                }
            }

            if !self.run.terminated {
                if let Err(e) = self.surface.scroll().await {
                    error!(error = %e, "scroll failure, aborting run");
                    self.run.terminate(TerminationReason::Fatal {
                        error: e.to_string(),
                    });
                }
            }
        }

        let summary = self.summarize();
        info!(%summary, "run finished");
        Ok(summary)
    }

    /// Record a skip decision as this post's terminal state
    async fn record_skip(&mut self, post: &PostRecord, reason: SkipReason) -> Result<()> {
        let entry = AuditEntry::new(
            self.run.run_id,
            &post.post_id,
            EngagementDecision::Skip(reason),
            SubmissionStatus::Skipped(reason),
        );
        self.audit
            .append(&entry)
            .await
            .context("failed to record skip")?;
        self.tally.skipped += 1;
        Ok(())
    }

    /// Drive one engage decision: draft, submit at most once, record.
    async fn engage(&mut self, post: &PostRecord) -> Result<()> {
        let draft = match self.generator.generate(post).await {
            Ok(draft) => draft,
            Err(e) => {
                // One failed draft never stalls the run.
                warn!(post_id = %post.post_id, error = %e, "generation failed, skipping post");
                let entry = AuditEntry::new(
                    self.run.run_id,
                    &post.post_id,
                    EngagementDecision::Engage,
                    SubmissionStatus::Skipped(SkipReason::GenerationFailed),
                );
                self.audit
                    .append(&entry)
                    .await
                    .context("failed to record generation failure")?;
                self.tally.skipped += 1;
                return Ok(());
            }
        };

        let result = submit(&mut self.surface, post, &draft).await;
        let entry = AuditEntry::new(
            self.run.run_id,
            &post.post_id,
            EngagementDecision::Engage,
            result.status.clone(),
        )
        .with_draft(draft.text.clone());
        self.audit
            .append(&entry)
            .await
            .context("failed to record submission outcome")?;

        match result.status {
            SubmissionStatus::Posted => {
                self.run.engaged_count += 1;
                self.dedup.record(&post.post_id, SeenKind::Engaged);
                self.tally.posted += 1;
                if !self.engagement_delay.is_zero() {
                    tokio::time::sleep(self.engagement_delay).await;
                }
            }
            SubmissionStatus::Failed(_) => {
                self.tally.failed += 1;
            }
            SubmissionStatus::Skipped(_) => {}
        }

        Ok(())
    }

    fn summarize(&self) -> RunSummary {
        RunSummary {
            run_id: self.run.run_id,
            posted: self.tally.posted,
            skipped: self.tally.skipped,
            failed: self.tally.failed,
            evaluated: self.run.evaluated_count,
            termination_reason: self
                .run
                .termination_reason
                .clone()
                .unwrap_or(TerminationReason::FeedExhausted),
            started_at: self.run.started_at,
            finished_at: Utc::now(),
        }
    }
}
