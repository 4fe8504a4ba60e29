//! Post extraction: raw on-screen elements to normalized records.
//!
//! Extraction is a pure transform over a snapshot of the feed. A single
//! element failing to extract drops that element only; the run continues.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Opaque handle to an on-screen post, valid only for the current page state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostRef(String);

impl PostRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw feed element as delivered by the feed collaborator.
///
/// All content fields are optional; what the platform actually exposes
/// varies per post and per page load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawElement {
    /// Platform-provided post identifier, if one is exposed
    #[serde(default)]
    pub source_id: Option<String>,

    /// Display name of the post author
    #[serde(default)]
    pub author: Option<String>,

    /// Visible post text
    #[serde(default)]
    pub description: Option<String>,

    /// Optional platform fields (timestamp, like count, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// On-screen handle used for submission; defaults to the post id
    #[serde(default)]
    pub post_ref: Option<PostRef>,
}

/// A normalized post, ready for policy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    /// Stable identity, platform id or content-hash fallback
    pub post_id: String,

    /// Author display name (empty if the platform hid it)
    pub author: String,

    /// Post text (possibly empty)
    pub description: String,

    /// When this record was extracted
    pub captured_at: DateTime<Utc>,

    /// Optional platform fields carried through unmodified
    pub raw_metadata: HashMap<String, String>,

    /// Handle for the submission collaborator
    pub post_ref: PostRef,
}

/// Errors for a single failed extraction
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("element is missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed element: {0}")]
    Malformed(String),
}

/// Extract a normalized [`PostRecord`] from a raw feed element.
///
/// An element that cannot yield a stable identity (no platform id and no
/// content to hash) fails with `MissingField("post_id")`; the caller skips
/// that element and continues with the rest of the page.
pub fn extract(element: &RawElement) -> Result<PostRecord, ExtractionError> {
    let author = element
        .author
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let description = element
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let post_id = match element.source_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => {
            if id.chars().any(|c| c.is_control()) {
                return Err(ExtractionError::Malformed(format!(
                    "post id contains control characters: {:?}",
                    id
                )));
            }
            id.to_string()
        }
        // No platform id exposed: fall back to hashing the visible content.
        _ if !author.is_empty() || !description.is_empty() => {
            format!("content:{}", content_hash(&author, &description))
        }
        _ => return Err(ExtractionError::MissingField("post_id")),
    };

    let post_ref = element
        .post_ref
        .clone()
        .unwrap_or_else(|| PostRef::new(post_id.clone()));

    Ok(PostRecord {
        post_id,
        author,
        description,
        captured_at: Utc::now(),
        raw_metadata: element.metadata.clone(),
        post_ref,
    })
}

/// Hash author + description into a short stable identifier (16 hex chars).
fn content_hash(author: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(author.as_bytes());
    hasher.update(b"\n");
    hasher.update(description.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
