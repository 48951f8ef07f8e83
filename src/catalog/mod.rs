//! Backup catalog: the append-only record of export attempts and their outcomes.

pub(crate) mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::errors::Result;

pub use postgres::PgBackupCatalog;

const COMPLETED: &str = "Completed";
const FAILED: &str = "Failed";

/// Outcome label of a catalog entry. Anything other than `Completed` and
/// `Failed` is carried through as an opaque label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    Completed,
    Failed,
    Other(String),
}

impl BackupStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BackupStatus::Completed => COMPLETED,
            BackupStatus::Failed => FAILED,
            BackupStatus::Other(label) => label,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BackupStatus::Completed)
    }
}

impl From<&str> for BackupStatus {
    fn from(label: &str) -> Self {
        match label {
            COMPLETED => BackupStatus::Completed,
            FAILED => BackupStatus::Failed,
            other => BackupStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for BackupStatus {
    fn from(label: String) -> Self {
        BackupStatus::from(label.as_str())
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One export of the source database, as written to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupEntry {
    pub id: String,
    pub status: BackupStatus,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

/// An entry about to be appended; the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBackupEntry {
    pub status: BackupStatus,
    pub error: Option<String>,
}

impl NewBackupEntry {
    pub fn failed(message: impl Into<String>) -> Self {
        NewBackupEntry {
            status: BackupStatus::Failed,
            error: Some(message.into()),
        }
    }
}

/// Append-only access to the backup catalog. Entries are never updated or deleted.
#[async_trait]
pub trait BackupCatalog: Send + Sync {
    /// Every entry whose status is `Completed`, in no particular order.
    async fn list_completed(&self) -> Result<Vec<BackupEntry>>;

    async fn append(&self, entry: NewBackupEntry) -> Result<BackupEntry>;
}
