//! Comment generation with retry and length enforcement.

use tracing::{debug, warn};

use super::retry::{ErrorClass, RetryPolicy, RetryStep};
use crate::adapters::{GenerationError, LanguageModel};
use crate::domain::{CommentDraft, PostRecord};

/// Fixed instruction template; the only inputs are author and description,
/// so the same post always produces the same prompt.
const ENGAGEMENT_PROMPT: &str = "\
You are replying to a social feed post.

Author: {author}
Post:
{description}

Write one contextual reply comment. Rules:
- a single line of plain text, no markdown, no hashtags, no URLs
- professional and specific to the post, not promotional
- at most two relevant emojis
- return exactly the comment text, nothing else";

/// Produces a validated [`CommentDraft`] per post
pub struct CommentGenerator<M> {
    model: M,
    retry: RetryPolicy,
    max_comment_chars: usize,
}

impl<M: LanguageModel> CommentGenerator<M> {
    pub fn new(model: M, retry: RetryPolicy, max_comment_chars: usize) -> Self {
        Self {
            model,
            retry,
            max_comment_chars,
        }
    }

    /// Deterministic prompt for a post
    pub fn build_prompt(post: &PostRecord) -> String {
        let author = if post.author.is_empty() {
            "unknown"
        } else {
            &post.author
        };
        ENGAGEMENT_PROMPT
            .replace("{author}", author)
            .replace("{description}", &post.description)
    }

    /// Generate a draft for `post`, retrying transient failures with
    /// exponential backoff. Permanent failures (and exhausted retries)
    /// propagate to the caller; the run is never stalled for one post.
    pub async fn generate(&self, post: &PostRecord) -> Result<CommentDraft, GenerationError> {
        let prompt = Self::build_prompt(post);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.model.complete(&prompt).await {
                Ok(text) => {
                    if text.trim().is_empty() {
                        return Err(GenerationError::Permanent(
                            "model returned an empty comment".to_string(),
                        ));
                    }
                    debug!(post_id = %post.post_id, attempt, "draft generated");
                    return Ok(CommentDraft::new(
                        post.post_id.clone(),
                        &text,
                        attempt,
                        self.max_comment_chars,
                    ));
                }
                Err(e) => {
                    let class = if e.is_transient() {
                        ErrorClass::Transient
                    } else {
                        ErrorClass::Permanent
                    };
                    match self.retry.next_step(class, attempt) {
                        RetryStep::Retry { delay } => {
                            warn!(
                                post_id = %post.post_id,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "generation failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryStep::GiveUp => {
                            warn!(post_id = %post.post_id, attempt, error = %e, "generation gave up");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }
}
