//! Command-line interface for feedpilot.
//!
//! Provides commands for running an engagement pass over a feed,
//! inspecting the audit history, and showing resolved configuration.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::adapters::{GeminiClient, ScriptedSurface};
use crate::config;
use crate::core::{AuditLog, CancelFlag, PipelineController, RunConfig};
use crate::domain::SubmissionStatus;

/// feedpilot - Audited feed engagement pipeline
#[derive(Parser, Debug)]
#[command(name = "feedpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one engagement pass over a captured feed
    Run {
        /// Feed capture file (JSONL, one raw element per line)
        feed: PathBuf,

        /// Override the configured engagement budget for this run
        #[arg(short, long)]
        budget: Option<u32>,

        /// Elements per feed page
        #[arg(long, default_value = "10")]
        page_size: usize,
    },

    /// Show recent audit log entries
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Summarize the audit log
    Status,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                feed,
                budget,
                page_size,
            } => run_feed(&feed, budget, page_size).await,
            Commands::History { limit } => show_history(limit).await,
            Commands::Status => show_status().await,
            Commands::Config => show_config(),
        }
    }
}

/// Run the pipeline over a captured feed file
async fn run_feed(feed: &PathBuf, budget: Option<u32>, page_size: usize) -> Result<()> {
    let config = config::config()?;

    let surface = ScriptedSurface::from_file(feed, page_size)
        .await
        .with_context(|| format!("failed to load feed capture: {}", feed.display()))?;

    let model = GeminiClient::new(&config.ai).context("failed to build language model client")?;

    let audit = AuditLog::open(&config.audit_log_path())
        .await
        .context("failed to open audit log")?;

    let run_config = RunConfig {
        budget_limit: budget.unwrap_or(config.engagement.budget_limit),
        min_description_chars: config.engagement.min_description_length,
        max_comment_chars: config.engagement.max_comment_chars,
        skip_replay_limit: config.engagement.skip_replay_limit,
        engagement_delay: std::time::Duration::from_secs(config.engagement.engagement_delay_secs),
        retry: config.engagement.retry.clone(),
    };
    if run_config.budget_limit == 0 {
        bail!("engagement budget must be greater than zero");
    }

    let mut controller = PipelineController::new(surface, model, audit, run_config).await?;

    // Ctrl-C requests a clean stop at the next post boundary.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing current post");
                cancel.cancel();
            }
        });
    }
    controller = controller.with_cancel_flag(cancel);

    let summary = controller.run().await?;
    println!("{summary}");

    if summary.termination_reason.is_fatal() {
        bail!("run aborted by a fatal surface failure");
    }
    Ok(())
}

/// Print the most recent audit entries, oldest first
async fn show_history(limit: usize) -> Result<()> {
    let config = config::config()?;
    let audit = AuditLog::open(&config.audit_log_path())
        .await
        .context("failed to open audit log")?;

    let entries = audit.replay().await?;
    let start = entries.len().saturating_sub(limit);

    for entry in &entries[start..] {
        let outcome = match &entry.result {
            SubmissionStatus::Posted => "posted".to_string(),
            SubmissionStatus::Failed(kind) => format!("failed ({kind:?})"),
            SubmissionStatus::Skipped(reason) => format!("skipped ({reason:?})"),
        };
        println!(
            "{}  {}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.run_id,
            entry.post_id,
            outcome
        );
    }

    if entries.is_empty() {
        println!("audit log is empty");
    }
    Ok(())
}

/// Summarize audit log outcomes
async fn show_status() -> Result<()> {
    let config = config::config()?;
    let audit = AuditLog::open(&config.audit_log_path())
        .await
        .context("failed to open audit log")?;

    let entries = audit.replay().await?;
    let posted = entries.iter().filter(|e| e.is_posted()).count();
    let failed = entries
        .iter()
        .filter(|e| matches!(e.result, SubmissionStatus::Failed(_)))
        .count();
    let skipped = entries
        .iter()
        .filter(|e| matches!(e.result, SubmissionStatus::Skipped(_)))
        .count();
    let runs = entries
        .iter()
        .map(|e| e.run_id)
        .collect::<std::collections::HashSet<_>>()
        .len();

    println!("Audit log: {}", config.audit_log_path().display());
    println!("  Runs:    {runs}");
    println!("  Entries: {}", entries.len());
    println!("  Posted:  {posted}");
    println!("  Skipped: {skipped}");
    println!("  Failed:  {failed}");
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("Resolved configuration:");
    println!("  Home:         {}", config.home.display());
    println!("  Audit log:    {}", config.audit_log_path().display());
    println!("  Platform:     {}", config.platform.name);
    println!(
        "  Credentials:  {}",
        if config.platform.username.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    match &config.config_file {
        Some(path) => println!("  Config file:  {}", path.display()),
        None => println!("  Config file:  (none found)"),
    }
    println!("  Budget:       {}", config.engagement.budget_limit);
    println!(
        "  Min length:   {} chars",
        config.engagement.min_description_length
    );
    println!(
        "  Max comment:  {} chars",
        config.engagement.max_comment_chars
    );
    match config.engagement.skip_replay_limit {
        Some(limit) => println!("  Skip replay:  up to {limit} evaluations"),
        None => println!("  Skip replay:  unlimited"),
    }
    println!(
        "  Delay:        {}s after each engagement",
        config.engagement.engagement_delay_secs
    );
    println!("  Model:        {}", config.ai.model);
    println!(
        "  API key:      {}",
        if config.ai.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    Ok(())
}
