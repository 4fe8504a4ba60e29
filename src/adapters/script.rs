//! Scripted automation surface backed by a JSONL fixture.
//!
//! Stands in for the browser collaborator: replays raw feed elements from
//! a file (one JSON object per line) and records submissions in memory.
//! Real platform drivers live outside this crate and implement the same
//! [`FeedSource`] and [`CommentSurface`] traits.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{CommentSurface, FeedError, FeedPage, FeedSource, SubmissionError};
use crate::domain::{PostRef, RawElement};

/// Scripted per-post submission behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Accept the comment and make it visible
    Accept,

    /// Visibly refuse the action
    Reject,

    /// Accept the dispatch but never show the comment
    Unconfirmed,
}

/// A recorded submission: post ref plus comment text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSubmission {
    pub post_ref: String,
    pub text: String,
}

/// File- or memory-backed feed and submission surface
pub struct ScriptedSurface {
    pages: VecDeque<Vec<RawElement>>,
    submissions: Vec<RecordedSubmission>,
    outcomes: HashMap<String, ScriptedOutcome>,
    scroll_count: u32,
}

impl ScriptedSurface {
    /// Build a surface from pre-chunked pages of raw elements
    pub fn from_pages(pages: Vec<Vec<RawElement>>) -> Self {
        Self {
            pages: pages.into(),
            submissions: Vec::new(),
            outcomes: HashMap::new(),
            scroll_count: 0,
        }
    }

    /// Load raw elements from a JSONL file, chunked into pages of `page_size`
    pub async fn from_file(path: &Path, page_size: usize) -> Result<Self, FeedError> {
        let file = File::open(path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut elements = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let element: RawElement = serde_json::from_str(&line)
                .map_err(|e| FeedError::Surface(format!("bad feed fixture line: {}", e)))?;
            elements.push(element);
        }

        let size = page_size.max(1);
        let pages = elements
            .chunks(size)
            .map(|chunk| chunk.to_vec())
            .collect::<Vec<_>>();

        debug!(pages = pages.len(), "loaded scripted feed");
        Ok(Self::from_pages(pages))
    }

    /// Script the submission outcome for one post ref (default: accept)
    pub fn with_outcome(mut self, post_ref: impl Into<String>, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(post_ref.into(), outcome);
        self
    }

    /// Submissions recorded so far, in dispatch order
    pub fn submissions(&self) -> &[RecordedSubmission] {
        &self.submissions
    }

    /// How many times the feed was asked to scroll
    pub fn scroll_count(&self) -> u32 {
        self.scroll_count
    }

    fn outcome_for(&self, post_ref: &PostRef) -> ScriptedOutcome {
        self.outcomes
            .get(post_ref.as_str())
            .copied()
            .unwrap_or(ScriptedOutcome::Accept)
    }
}

#[async_trait]
impl FeedSource for ScriptedSurface {
    async fn next_page(&mut self) -> Result<FeedPage, FeedError> {
        match self.pages.pop_front() {
            Some(elements) => Ok(FeedPage::Elements(elements)),
            None => Ok(FeedPage::EndOfFeed),
        }
    }

    async fn scroll(&mut self) -> Result<(), FeedError> {
        self.scroll_count += 1;
        Ok(())
    }
}

#[async_trait]
impl CommentSurface for ScriptedSurface {
    async fn click_comment(
        &mut self,
        post_ref: &PostRef,
        text: &str,
    ) -> Result<(), SubmissionError> {
        match self.outcome_for(post_ref) {
            ScriptedOutcome::Reject => Err(SubmissionError::Rejected(format!(
                "comment refused for {}",
                post_ref
            ))),
            ScriptedOutcome::Accept | ScriptedOutcome::Unconfirmed => {
                self.submissions.push(RecordedSubmission {
                    post_ref: post_ref.as_str().to_string(),
                    text: text.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn comment_visible(
        &mut self,
        post_ref: &PostRef,
        text: &str,
    ) -> Result<bool, SubmissionError> {
        if self.outcome_for(post_ref) == ScriptedOutcome::Unconfirmed {
            return Ok(false);
        }
        Ok(self
            .submissions
            .iter()
            .any(|s| s.post_ref == post_ref.as_str() && s.text == text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn element(id: &str, author: &str, description: &str) -> RawElement {
        RawElement {
            source_id: Some(id.to_string()),
            author: Some(author.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pages_then_end_of_feed() {
        let mut surface = ScriptedSurface::from_pages(vec![
            vec![element("a", "Ada", "one")],
            vec![element("b", "Bo", "two")],
        ]);

        assert!(matches!(
            surface.next_page().await.unwrap(),
            FeedPage::Elements(ref els) if els.len() == 1
        ));
        assert!(matches!(
            surface.next_page().await.unwrap(),
            FeedPage::Elements(_)
        ));
        assert!(matches!(
            surface.next_page().await.unwrap(),
            FeedPage::EndOfFeed
        ));
    }

    #[tokio::test]
    async fn test_accepted_comment_becomes_visible() {
        let mut surface = ScriptedSurface::from_pages(vec![]);
        let post_ref = PostRef::new("p1");

        surface.click_comment(&post_ref, "hello").await.unwrap();
        assert!(surface.comment_visible(&post_ref, "hello").await.unwrap());
        assert_eq!(surface.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_comment_is_not_recorded() {
        let mut surface =
            ScriptedSurface::from_pages(vec![]).with_outcome("p1", ScriptedOutcome::Reject);
        let post_ref = PostRef::new("p1");

        let err = surface.click_comment(&post_ref, "hello").await.unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected(_)));
        assert!(surface.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_comment_dispatches_but_stays_invisible() {
        let mut surface =
            ScriptedSurface::from_pages(vec![]).with_outcome("p1", ScriptedOutcome::Unconfirmed);
        let post_ref = PostRef::new("p1");

        surface.click_comment(&post_ref, "hello").await.unwrap();
        assert!(!surface.comment_visible(&post_ref, "hello").await.unwrap());
        assert_eq!(surface.submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_from_file_chunks_into_pages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("feed.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..5 {
            writeln!(
                file,
                r#"{{"source_id": "p{}", "author": "Ada", "description": "post {}"}}"#,
                i, i
            )
            .unwrap();
        }

        let mut surface = ScriptedSurface::from_file(&path, 2).await.unwrap();
        let mut page_sizes = Vec::new();
        while let FeedPage::Elements(els) = surface.next_page().await.unwrap() {
            page_sizes.push(els.len());
        }
        assert_eq!(page_sizes, vec![2, 2, 1]);
    }
}
