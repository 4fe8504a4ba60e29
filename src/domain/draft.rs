//! Generated comment drafts and deterministic length enforcement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated but not-yet-submitted comment.
///
/// Construction goes through [`CommentDraft::new`], which enforces the
/// platform length limit, so a draft in hand is always valid to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    /// The post this draft replies to
    pub post_id: String,

    /// Comment text, non-empty and within the platform limit
    pub text: String,

    /// When generation finished
    pub generated_at: DateTime<Utc>,

    /// How many model calls it took (1 = no retries)
    pub attempt_count: u32,
}

impl CommentDraft {
    /// Build a draft from raw model output, truncating over-length text.
    pub fn new(
        post_id: impl Into<String>,
        raw_text: &str,
        attempt_count: u32,
        max_chars: usize,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            text: truncate_comment(raw_text.trim(), max_chars),
            generated_at: Utc::now(),
            attempt_count,
        }
    }
}

/// Truncate comment text to at most `max_chars` characters.
///
/// Prefers cutting at a word boundary when one falls within the last 10%
/// of the limit; otherwise cuts hard at the limit. Text already within the
/// limit is returned unchanged, so re-truncating is a no-op.
pub fn truncate_comment(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let boundary_floor = max_chars - max_chars / 10;
    let cut = chars[..max_chars]
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&i| i >= boundary_floor)
        .unwrap_or(max_chars);

    chars[..cut].iter().collect::<String>().trim_end().to_string()
}
