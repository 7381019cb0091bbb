//! Error taxonomy for the sync core.
//!
//! Storage failures affect correctness and are returned to callers; remote
//! failures only affect freshness and are logged by whoever receives them.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Which persistence operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageOp {
    Read,
    Write,
    Delete,
}

impl StorageOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOp::Read => "read",
            StorageOp::Write => "write",
            StorageOp::Delete => "delete",
        }
    }
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local persistence operation failed or returned data that could not be decoded.
#[derive(Debug, Error)]
#[error("storage {op} failed for {}: {source}", .key.as_deref().unwrap_or("<all keys>"))]
pub struct StorageFailure {
    pub op: StorageOp,
    /// Physical key involved; `None` for whole-store operations such as `clear`.
    pub key: Option<String>,
    #[source]
    pub source: anyhow::Error,
}

impl StorageFailure {
    pub fn new(op: StorageOp, key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            op,
            key: Some(key.into()),
            source: source.into(),
        }
    }

    pub fn read(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StorageOp::Read, key, source)
    }

    pub fn write(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StorageOp::Write, key, source)
    }

    pub fn delete(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StorageOp::Delete, key, source)
    }

    /// Plain-language text for the user; never mentions keys or causes.
    pub fn readable_message(&self) -> &'static str {
        match self.op {
            StorageOp::Read => "Unable to load your data. Please try again.",
            StorageOp::Write => "Unable to save your changes. Please try again.",
            StorageOp::Delete => "Unable to delete the data. Please try again.",
        }
    }
}

/// Push or pull against the remote store failed. Never fatal.
#[derive(Debug, Error)]
pub enum RemoteSyncFailure {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("remote operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("remote payload could not be decoded: {0}")]
    Decode(String),
}

/// Which step of the legacy-key restructuring failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    Copy,
    Validate,
    Cleanup,
    Rollback,
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MigrationStage::Copy => "copy",
            MigrationStage::Validate => "validate",
            MigrationStage::Cleanup => "cleanup",
            MigrationStage::Rollback => "rollback",
        };
        f.write_str(label)
    }
}

/// Legacy-to-partitioned restructuring failed. Legacy data is still intact.
#[derive(Debug, Error)]
#[error("data migration {stage} failed{}: {reason}", .key.as_deref().map(|k| format!(" for {k}")).unwrap_or_default())]
pub struct MigrationFailure {
    pub stage: MigrationStage,
    pub key: Option<String>,
    pub reason: String,
}

impl MigrationFailure {
    pub fn new(stage: MigrationStage, key: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            stage,
            key,
            reason: reason.into(),
        }
    }
}

/// The stored profile is missing fields or carries unusable values.
#[derive(Debug, Error)]
#[error("profile integrity check failed: {}", .issues.join("; "))]
pub struct ProfileIntegrityFailure {
    pub issues: Vec<String>,
}

/// Errors returned by the goal API.
#[derive(Debug, Error)]
pub enum GoalError {
    #[error(transparent)]
    Storage(#[from] StorageFailure),

    #[error("goal {0} does not exist")]
    NotFound(String),

    #[error("a goal record already exists for {0}")]
    DuplicateDate(NaiveDate),

    #[error("invalid {field}: {reason}")]
    InvalidMetric { field: &'static str, reason: String },
}

impl GoalError {
    pub fn readable_message(&self) -> String {
        match self {
            GoalError::Storage(failure) => failure.readable_message().to_string(),
            GoalError::NotFound(_) => "That day could not be found. Please refresh and try again.".into(),
            GoalError::DuplicateDate(date) => format!("You already have a check-in for {date}."),
            GoalError::InvalidMetric { reason, .. } => reason.clone(),
        }
    }
}
