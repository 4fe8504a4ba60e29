//! Append-only audit log with file-based persistence.
//!
//! Entries are stored as newline-delimited JSON (JSONL). A crash can leave
//! at most one torn line at the tail; torn lines never parse as valid JSON
//! and are dropped on replay, so partial logs stay usable.

use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::domain::AuditEntry;

/// Errors from the audit log
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit log already locked by another run: {0}")]
    Locked(PathBuf),
}

/// JSONL-backed audit log, exclusively held by one run at a time.
///
/// A sidecar advisory lock prevents two concurrent runs from interleaving
/// writes into the same log; the lock is released when the log is dropped.
pub struct AuditLog {
    path: PathBuf,
    _lock: std::fs::File,
}

impl AuditLog {
    /// Open (or create) the audit log at `path` and take the writer lock
    pub async fn open(path: &Path) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let lock_path = path.with_extension("lock");
        let lock = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| AuditError::Locked(path.to_path_buf()))?;

        Ok(Self {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    /// Path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it to disk
    pub async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let json = serde_json::to_string(entry)?;
        file.write_all(format!("{}\n", json).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Replay all entries in original append order.
    ///
    /// Unparseable lines (torn tail from a crash) are skipped with a warning.
    pub async fn replay(&self) -> Result<Vec<AuditEntry>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut entries = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unparseable audit line");
                }
            }
        }

        Ok(entries)
    }
}
