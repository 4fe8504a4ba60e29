//! Collaborator interfaces for external systems.
//!
//! The feed, the submission surface, and the language-generation service
//! are consumed only through the narrow traits defined here. The pipeline
//! controller owns the automation surface exclusively for a run's lifetime;
//! no other component talks to it directly.

pub mod gemini;
pub mod script;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{PostRef, RawElement};

pub use gemini::GeminiClient;
pub use script::{RecordedSubmission, ScriptedOutcome, ScriptedSurface};

/// One fetch from the feed collaborator
#[derive(Debug, Clone)]
pub enum FeedPage {
    /// Raw elements in feed-native order
    Elements(Vec<RawElement>),

    /// The feed has no more posts
    EndOfFeed,
}

/// Run-fatal failures of the shared automation surface
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("automation surface failure: {0}")]
    Surface(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the language-generation service.
///
/// Transient failures (timeouts, rate limits, server errors) are retried;
/// permanent ones (invalid input, content-policy rejection) are not.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transient generation failure: {0}")]
    Transient(String),

    #[error("permanent generation failure: {0}")]
    Permanent(String),
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failures of a single submission action
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The platform visibly refused the action; nothing was posted
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The action was dispatched but its outcome is unknown
    #[error("submission unconfirmed: {0}")]
    Unconfirmed(String),
}

/// The scrolling feed of candidate posts
#[async_trait]
pub trait FeedSource: Send {
    /// Fetch the next batch of on-screen elements, in feed-native order
    async fn next_page(&mut self) -> Result<FeedPage, FeedError>;

    /// Trigger loading of more content
    async fn scroll(&mut self) -> Result<(), FeedError>;
}

/// The submission side of the automation surface
#[async_trait]
pub trait CommentSurface: Send {
    /// Dispatch a comment on the post behind `post_ref`
    async fn click_comment(&mut self, post_ref: &PostRef, text: &str)
        -> Result<(), SubmissionError>;

    /// Check whether the submitted text is now visible under the post
    async fn comment_visible(
        &mut self,
        post_ref: &PostRef,
        text: &str,
    ) -> Result<bool, SubmissionError>;
}

/// The language-generation collaborator
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt into reply text
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
