// restoretool/src/restore/orchestrator.rs
use std::fmt;
use std::sync::Arc;

use super::selector::BackupSelector;
use crate::catalog::{BackupCatalog, BackupEntry};
use crate::errors::Result;
use crate::import::ImportService;
use crate::replay::ReplayLauncher;
use crate::status::{
    RecordHandle, STATUS_COMPLETED, STATUS_REPLAYING, STATUS_RUNNING_IMPORT, StatusRecorder,
    StatusStore,
};

/// Where a restore attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    SelectingBackup,
    NoBackupFound,
    ImportRequested,
    ImportRunning,
    BaseRestored,
    Completed,
    Failed,
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RestoreState::SelectingBackup => "selecting backup",
            RestoreState::NoBackupFound => "no backup found",
            RestoreState::ImportRequested => "import requested",
            RestoreState::ImportRunning => "import running",
            RestoreState::BaseRestored => "base restored",
            RestoreState::Completed => "completed",
            RestoreState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal result of one restore attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    NoBackupFound {
        tracking_id: String,
    },
    Completed {
        tracking_id: String,
        backup_id: String,
        operation: String,
    },
    /// The failure has been written to the backup catalog.
    Failed {
        tracking_id: String,
        failed_in: RestoreState,
        message: String,
    },
}

impl RestoreOutcome {
    pub fn tracking_id(&self) -> &str {
        match self {
            RestoreOutcome::NoBackupFound { tracking_id }
            | RestoreOutcome::Completed { tracking_id, .. }
            | RestoreOutcome::Failed { tracking_id, .. } => tracking_id,
        }
    }

    pub fn state(&self) -> RestoreState {
        match self {
            RestoreOutcome::NoBackupFound { .. } => RestoreState::NoBackupFound,
            RestoreOutcome::Completed { .. } => RestoreState::Completed,
            RestoreOutcome::Failed { .. } => RestoreState::Failed,
        }
    }
}

/// Drives a restore: pick the latest completed backup, import it, wait for the
/// import, launch the replay job, recording progress at every milestone.
///
/// Concurrent runs are not excluded from one another. Two runs started at the
/// same time select the same backup and start two independent imports, each
/// under its own tracking id.
pub struct ImportOrchestrator {
    selector: BackupSelector,
    recorder: StatusRecorder,
    importer: Arc<dyn ImportService>,
    replay: Arc<dyn ReplayLauncher>,
}

impl ImportOrchestrator {
    pub fn new(
        catalog: Arc<dyn BackupCatalog>,
        status_store: Arc<dyn StatusStore>,
        importer: Arc<dyn ImportService>,
        replay: Arc<dyn ReplayLauncher>,
    ) -> Self {
        ImportOrchestrator {
            selector: BackupSelector::new(catalog.clone()),
            recorder: StatusRecorder::new(status_store, catalog),
            importer,
            replay,
        }
    }

    /// Runs one restore attempt.
    ///
    /// Only a failure to write the placeholder or to read the catalog is
    /// returned as an error. Anything that goes wrong once the import has been
    /// requested is recorded in the catalog and reported as
    /// [`RestoreOutcome::Failed`].
    pub async fn run_restore(&self) -> Result<RestoreOutcome> {
        let handle = self.recorder.create_placeholder().await?;
        tracing::info!(tracking_id = %handle, state = %RestoreState::SelectingBackup, "🔄 Starting restore attempt");

        let Some(backup) = self.selector.select_latest_completed_backup().await? else {
            tracing::info!(tracking_id = %handle, "No backup found");
            return Ok(RestoreOutcome::NoBackupFound {
                tracking_id: handle.tracking_id().to_string(),
            });
        };
        tracing::info!(
            tracking_id = %handle,
            backup_id = %backup.id,
            backup_timestamp = %backup.timestamp,
            "selected latest completed backup"
        );

        let mut state = RestoreState::ImportRequested;
        match self.drive_import(&handle, &backup, &mut state).await {
            Ok(operation) => {
                tracing::info!(tracking_id = %handle, backup_id = %backup.id, %operation, "✅ Restore completed");
                Ok(RestoreOutcome::Completed {
                    tracking_id: handle.tracking_id().to_string(),
                    backup_id: backup.id,
                    operation,
                })
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(
                    tracking_id = %handle,
                    backup_id = %backup.id,
                    failed_in = %state,
                    error = %message,
                    "❌ Error restoring backup"
                );
                if let Err(record_err) = self.recorder.record_failure(&message).await {
                    tracing::error!(
                        tracking_id = %handle,
                        error = %record_err,
                        "failed to record restore failure in backup catalog"
                    );
                }
                Ok(RestoreOutcome::Failed {
                    tracking_id: handle.tracking_id().to_string(),
                    failed_in: state,
                    message,
                })
            }
        }
    }

    /// Steps after selection. `state` tracks the step in progress so a failure
    /// can be attributed; the operation name is returned on success.
    async fn drive_import(
        &self,
        handle: &RecordHandle,
        backup: &BackupEntry,
        state: &mut RestoreState,
    ) -> Result<String> {
        let import = self.importer.create_import(&backup.id).await?;
        let operation = import.operation.name;

        *state = RestoreState::ImportRunning;
        self.recorder
            .advance(handle, &import.id, STATUS_RUNNING_IMPORT, &operation)
            .await?;

        self.importer.wait_for_completion(&operation).await?;

        *state = RestoreState::BaseRestored;
        self.recorder
            .advance(handle, &import.id, STATUS_REPLAYING, &operation)
            .await?;

        self.replay.launch().await?;

        self.recorder
            .advance(handle, &import.id, STATUS_COMPLETED, &operation)
            .await?;
        *state = RestoreState::Completed;

        Ok(operation)
    }
}
