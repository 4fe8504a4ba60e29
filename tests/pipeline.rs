//! End-to-end pipeline tests over a scripted surface.
//!
//! Each test drives the controller against in-memory feed pages and a
//! scripted language model, then inspects the audit log on disk the same
//! way a later run would: by replaying it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use feedpilot::adapters::{
    GenerationError, LanguageModel, RecordedSubmission, ScriptedOutcome, ScriptedSurface,
};
use feedpilot::core::{AuditLog, CancelFlag, DedupStore, PipelineController, RunConfig};
use feedpilot::domain::{
    AuditEntry, EngagementDecision, FailureKind, RawElement, RunSummary, SkipReason,
    SubmissionStatus, TerminationReason,
};

/// Scripted language model: replies in order, then panics if over-asked
struct ScriptModel {
    replies: Mutex<Vec<Result<String, GenerationError>>>,
}

impl ScriptModel {
    fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
        }
    }

    fn always(reply: &str, n: usize) -> Self {
        Self::new((0..n).map(|_| Ok(reply.to_string())).collect())
    }
}

#[async_trait]
impl LanguageModel for ScriptModel {
    async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.replies.lock().unwrap().remove(0)
    }
}

fn element(id: &str, description: &str) -> RawElement {
    RawElement {
        source_id: Some(id.to_string()),
        author: Some("Ada".to_string()),
        description: Some(description.to_string()),
        ..Default::default()
    }
}

fn fast_config(budget: u32) -> RunConfig {
    RunConfig {
        budget_limit: budget,
        ..Default::default()
    }
}

async fn run_once(
    audit_path: &Path,
    surface: ScriptedSurface,
    model: ScriptModel,
    config: RunConfig,
) -> (RunSummary, Vec<RecordedSubmission>) {
    let audit = AuditLog::open(audit_path).await.unwrap();
    let mut controller = PipelineController::new(surface, model, audit, config)
        .await
        .unwrap();
    let summary = controller.run().await.unwrap();
    let submissions = controller.surface().submissions().to_vec();
    (summary, submissions)
}

async fn replay(audit_path: &Path) -> Vec<AuditEntry> {
    let audit = AuditLog::open(audit_path).await.unwrap();
    audit.replay().await.unwrap()
}

fn audit_path(temp: &TempDir) -> PathBuf {
    temp.path().join("linkedin").join("audit.jsonl")
}

#[tokio::test]
async fn test_mixed_feed_respects_budget_and_content_policy() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    // Three posts, budget two: engage, skip (no content), engage.
    let surface = ScriptedSurface::from_pages(vec![vec![
        element("p1", "great trip!"),
        element("p2", ""),
        element("p3", "nice photo"),
    ]]);
    let (summary, submissions) =
        run_once(&path, surface, ScriptModel::always("Love this!", 2), fast_config(2)).await;

    assert_eq!(summary.posted, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.evaluated, 3);
    assert_eq!(submissions.len(), 2);
    assert_eq!(summary.termination_reason, TerminationReason::FeedExhausted);

    // Audit entries are in evaluation order, decisions as expected.
    let entries = replay(&path).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].post_id, "p1");
    assert_eq!(entries[0].decision, EngagementDecision::Engage);
    assert_eq!(entries[0].result, SubmissionStatus::Posted);
    assert_eq!(
        entries[1].decision,
        EngagementDecision::Skip(SkipReason::InsufficientContent)
    );
    assert_eq!(entries[2].result, SubmissionStatus::Posted);
    assert!(entries[0].draft_text.is_some());
    assert!(entries[1].draft_text.is_none());
}

#[tokio::test]
async fn test_budget_ends_run_before_remaining_posts_are_decided() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    let surface = ScriptedSurface::from_pages(vec![vec![
        element("p1", "one"),
        element("p2", "two"),
        element("p3", "three"),
    ]]);
    let (summary, submissions) =
        run_once(&path, surface, ScriptModel::always("Nice!", 2), fast_config(2)).await;

    assert_eq!(summary.posted, 2);
    assert_eq!(summary.termination_reason, TerminationReason::EndOfBudget);
    assert_eq!(submissions.len(), 2);

    // p3 was never decided: no audit entry for it.
    let entries = replay(&path).await;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.post_id != "p3"));
}

#[tokio::test]
async fn test_posted_comment_is_never_repeated_across_runs() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);
    let pages = || vec![vec![element("p1", "a fine post")]];

    let (first, first_subs) = run_once(
        &path,
        ScriptedSurface::from_pages(pages()),
        ScriptModel::always("Great!", 1),
        fast_config(5),
    )
    .await;
    assert_eq!(first.posted, 1);
    assert_eq!(first_subs.len(), 1);

    // Same feed again: the post is recognized and skipped.
    let (second, second_subs) = run_once(
        &path,
        ScriptedSurface::from_pages(pages()),
        ScriptModel::new(vec![]),
        fast_config(5),
    )
    .await;
    assert_eq!(second.posted, 0);
    assert_eq!(second.skipped, 1);
    assert!(second_subs.is_empty());

    let entries = replay(&path).await;
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].decision,
        EngagementDecision::Skip(SkipReason::AlreadyEngaged)
    );
    assert_ne!(entries[0].run_id, entries[1].run_id);
}

#[tokio::test]
async fn test_permanent_generation_failure_skips_post_and_continues() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    let surface = ScriptedSurface::from_pages(vec![vec![
        element("p1", "first"),
        element("p2", "second"),
    ]]);
    let model = ScriptModel::new(vec![
        Err(GenerationError::Permanent("content blocked".to_string())),
        Ok("A fine reply".to_string()),
    ]);
    let (summary, submissions) = run_once(&path, surface, model, fast_config(5)).await;

    assert_eq!(summary.posted, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].post_ref, "p2");

    let entries = replay(&path).await;
    assert_eq!(entries[0].decision, EngagementDecision::Engage);
    assert_eq!(
        entries[0].result,
        SubmissionStatus::Skipped(SkipReason::GenerationFailed)
    );
}

#[tokio::test]
async fn test_unconfirmed_submission_is_eligible_again_next_run() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);
    let pages = || vec![vec![element("p1", "a fine post")]];

    let surface =
        ScriptedSurface::from_pages(pages()).with_outcome("p1", ScriptedOutcome::Unconfirmed);
    let (first, _) = run_once(&path, surface, ScriptModel::always("Hi!", 1), fast_config(5)).await;
    assert_eq!(first.posted, 0);
    assert_eq!(first.failed, 1);

    let entries = replay(&path).await;
    assert_eq!(
        entries[0].result,
        SubmissionStatus::Failed(FailureKind::Unconfirmed)
    );

    // Outcome unknown, so the next run evaluates the post again.
    let (second, second_subs) = run_once(
        &path,
        ScriptedSurface::from_pages(pages()),
        ScriptModel::always("Hi again!", 1),
        fast_config(5),
    )
    .await;
    assert_eq!(second.posted, 1);
    assert_eq!(second_subs.len(), 1);
}

#[tokio::test]
async fn test_rejected_submission_is_never_retried_across_runs() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);
    let pages = || vec![vec![element("p1", "a fine post")]];

    let surface = ScriptedSurface::from_pages(pages()).with_outcome("p1", ScriptedOutcome::Reject);
    let (first, first_subs) =
        run_once(&path, surface, ScriptModel::always("Hi!", 1), fast_config(5)).await;
    assert_eq!(first.failed, 1);
    assert!(first_subs.is_empty());

    // A visible refusal is final: the next run does not click again.
    let (second, second_subs) = run_once(
        &path,
        ScriptedSurface::from_pages(pages()),
        ScriptModel::new(vec![]),
        fast_config(5),
    )
    .await;
    assert_eq!(second.skipped, 1);
    assert!(second_subs.is_empty());

    let entries = replay(&path).await;
    assert_eq!(
        entries[1].decision,
        EngagementDecision::Skip(SkipReason::Duplicate)
    );
}

#[tokio::test]
async fn test_zero_budget_run_produces_no_entries() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    let surface = ScriptedSurface::from_pages(vec![vec![element("p1", "a fine post")]]);
    let (summary, submissions) =
        run_once(&path, surface, ScriptModel::new(vec![]), fast_config(0)).await;

    assert_eq!(summary.termination_reason, TerminationReason::EndOfBudget);
    assert_eq!(summary.evaluated, 0);
    assert!(submissions.is_empty());
    assert!(replay(&path).await.is_empty());
}

#[tokio::test]
async fn test_dedup_rebuild_is_deterministic_over_real_history() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    let surface = ScriptedSurface::from_pages(vec![vec![
        element("p1", "one"),
        element("p2", ""),
        element("p3", "three"),
    ]])
    .with_outcome("p3", ScriptedOutcome::Reject);
    run_once(&path, surface, ScriptModel::always("Hi!", 2), fast_config(5)).await;

    let entries = replay(&path).await;
    let once = DedupStore::rebuild(&entries, None);
    let twice = DedupStore::rebuild(&entries, None);
    assert_eq!(once, twice);
    // Posted and rejected posts are accounted for; the plain skip stays
    // eligible for re-evaluation.
    assert_eq!(once.len(), 2);
}

#[tokio::test]
async fn test_cancellation_stops_at_a_post_boundary() {
    let temp = TempDir::new().unwrap();
    let path = audit_path(&temp);

    let surface = ScriptedSurface::from_pages(vec![vec![element("p1", "a fine post")]]);
    let audit = AuditLog::open(&path).await.unwrap();
    let mut controller =
        PipelineController::new(surface, ScriptModel::new(vec![]), audit, fast_config(5))
            .await
            .unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    controller = controller.with_cancel_flag(cancel);

    let summary = controller.run().await.unwrap();
    assert_eq!(summary.termination_reason, TerminationReason::Cancelled);
    assert_eq!(summary.evaluated, 0);
    assert!(controller.surface().submissions().is_empty());
}
