//! Progress tracking for restore attempts.

pub(crate) mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{BackupCatalog, BackupEntry, NewBackupEntry};
use crate::errors::Result;

pub use postgres::PgStatusStore;

pub const STATUS_RUNNING_IMPORT: &str = "Running import...";
pub const STATUS_REPLAYING: &str = "Initial backup restored, replaying final updates...";
pub const STATUS_COMPLETED: &str = "Completed";

/// Progress of one restore attempt. A freshly created placeholder has every field unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusRecord {
    pub id: Option<String>,
    pub status: Option<String>,
    pub operation: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn is_placeholder(&self) -> bool {
        self.id.is_none() && self.status.is_none() && self.operation.is_none()
    }
}

/// Full replacement for a status record; the store stamps it with the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub backup_id: String,
    pub status: String,
    pub operation: String,
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Writes an empty record under `tracking_id`.
    async fn create(&self, tracking_id: &str) -> Result<()>;

    /// Replaces the record under `tracking_id`, creating it if it is missing.
    async fn overwrite(&self, tracking_id: &str, update: &StatusUpdate) -> Result<()>;
}

/// Tracking identifier of one restore attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHandle(String);

impl RecordHandle {
    pub fn tracking_id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Writes progress to the status store and failures to the backup catalog.
#[derive(Clone)]
pub struct StatusRecorder {
    store: Arc<dyn StatusStore>,
    catalog: Arc<dyn BackupCatalog>,
}

impl StatusRecorder {
    pub fn new(store: Arc<dyn StatusStore>, catalog: Arc<dyn BackupCatalog>) -> Self {
        StatusRecorder { store, catalog }
    }

    /// Allocates a new tracking id and persists an empty record under it right away.
    pub async fn create_placeholder(&self) -> Result<RecordHandle> {
        let handle = RecordHandle(Uuid::new_v4().to_string());
        self.store.create(handle.tracking_id()).await?;
        tracing::debug!(tracking_id = %handle, "created restore status placeholder");
        Ok(handle)
    }

    pub async fn advance(
        &self,
        handle: &RecordHandle,
        backup_id: &str,
        status: &str,
        operation: &str,
    ) -> Result<()> {
        let update = StatusUpdate {
            backup_id: backup_id.to_string(),
            status: status.to_string(),
            operation: operation.to_string(),
        };
        self.store.overwrite(handle.tracking_id(), &update).await?;
        tracing::info!(tracking_id = %handle, backup_id, operation, "{}", status);
        Ok(())
    }

    /// Appends a `Failed` entry to the backup catalog. The tracking record is left as it was.
    pub async fn record_failure(&self, message: &str) -> Result<BackupEntry> {
        self.catalog.append(NewBackupEntry::failed(message)).await
    }
}
