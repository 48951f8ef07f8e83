// In-memory collaborators for unit tests.
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::catalog::{BackupCatalog, BackupEntry, BackupStatus, NewBackupEntry};
use crate::errors::{RestoreError, Result};
use crate::import::{ImportOperation, ImportService, OperationRef};
use crate::replay::ReplayLauncher;
use crate::status::{StatusRecord, StatusStore, StatusUpdate};
use crate::utils::clock::Clock;

pub fn entry(id: &str, status: &str, timestamp_secs: i64) -> BackupEntry {
    BackupEntry {
        id: id.to_string(),
        status: BackupStatus::from(status),
        timestamp: Utc.timestamp_opt(timestamp_secs, 0).unwrap(),
        error: None,
    }
}

/// Clock that advances one second on every read.
pub struct FixedClock {
    start: DateTime<Utc>,
    ticks: AtomicUsize,
}

impl FixedClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        FixedClock {
            start,
            ticks: AtomicUsize::new(0),
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        FixedClock::starting_at(Utc.timestamp_opt(1_000_000, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::seconds(tick as i64)
    }
}

fn injected(slot: &Mutex<Option<String>>) -> Option<String> {
    slot.lock().unwrap().clone()
}

#[derive(Default)]
pub struct InMemoryBackupCatalog {
    entries: Mutex<Vec<BackupEntry>>,
    clock: FixedClock,
    lookup_error: Mutex<Option<String>>,
    append_error: Mutex<Option<String>>,
    next_id: AtomicUsize,
}

impl InMemoryBackupCatalog {
    pub fn with_entries(entries: Vec<BackupEntry>) -> Self {
        let catalog = InMemoryBackupCatalog::default();
        *catalog.entries.lock().unwrap() = entries;
        catalog
    }

    pub fn entries(&self) -> Vec<BackupEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn fail_lookups(&self, message: &str) {
        *self.lookup_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_appends(&self, message: &str) {
        *self.append_error.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl BackupCatalog for InMemoryBackupCatalog {
    async fn list_completed(&self) -> Result<Vec<BackupEntry>> {
        if let Some(message) = injected(&self.lookup_error) {
            return Err(RestoreError::Sqlx(sqlx::Error::Protocol(message)));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status.is_completed())
            .cloned()
            .collect())
    }

    async fn append(&self, entry: NewBackupEntry) -> Result<BackupEntry> {
        if let Some(message) = injected(&self.append_error) {
            return Err(RestoreError::Sqlx(sqlx::Error::Protocol(message)));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = BackupEntry {
            id: format!("appended-{id}"),
            status: entry.status,
            timestamp: self.clock.now(),
            error: entry.error,
        };
        self.entries.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

/// Status store keeping every version written under each tracking id.
#[derive(Default)]
pub struct InMemoryStatusStore {
    history: Mutex<HashMap<String, Vec<StatusRecord>>>,
    order: Mutex<Vec<String>>,
    clock: FixedClock,
    create_error: Mutex<Option<String>>,
    overwrite_error: Mutex<Option<String>>,
}

impl InMemoryStatusStore {
    pub fn history(&self, tracking_id: &str) -> Vec<StatusRecord> {
        self.history
            .lock()
            .unwrap()
            .get(tracking_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn current(&self, tracking_id: &str) -> Option<StatusRecord> {
        self.history(tracking_id).last().cloned()
    }

    pub fn tracking_ids(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn fail_creates(&self, message: &str) {
        *self.create_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_overwrites(&self, message: &str) {
        *self.overwrite_error.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn create(&self, tracking_id: &str) -> Result<()> {
        if let Some(message) = injected(&self.create_error) {
            return Err(RestoreError::StatusWrite(message));
        }
        self.order.lock().unwrap().push(tracking_id.to_string());
        self.history
            .lock()
            .unwrap()
            .insert(tracking_id.to_string(), vec![StatusRecord::default()]);
        Ok(())
    }

    async fn overwrite(&self, tracking_id: &str, update: &StatusUpdate) -> Result<()> {
        if let Some(message) = injected(&self.overwrite_error) {
            return Err(RestoreError::StatusWrite(message));
        }
        let record = StatusRecord {
            id: Some(update.backup_id.clone()),
            status: Some(update.status.clone()),
            operation: Some(update.operation.clone()),
            timestamp: Some(self.clock.now()),
        };
        let mut history = self.history.lock().unwrap();
        if !history.contains_key(tracking_id) {
            self.order.lock().unwrap().push(tracking_id.to_string());
        }
        history.entry(tracking_id.to_string()).or_default().push(record);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeImportService {
    created: Mutex<Vec<String>>,
    waited: Mutex<Vec<String>>,
    create_error: Mutex<Option<String>>,
    wait_error: Mutex<Option<String>>,
    next_operation: AtomicUsize,
}

impl FakeImportService {
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn waited(&self) -> Vec<String> {
        self.waited.lock().unwrap().clone()
    }

    pub fn fail_create(&self, message: &str) {
        *self.create_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_wait(&self, message: &str) {
        *self.wait_error.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl ImportService for FakeImportService {
    async fn create_import(&self, backup_id: &str) -> Result<ImportOperation> {
        if let Some(message) = injected(&self.create_error) {
            return Err(RestoreError::ImportCreation(message));
        }
        self.created.lock().unwrap().push(backup_id.to_string());
        let n = self.next_operation.fetch_add(1, Ordering::SeqCst);
        Ok(ImportOperation {
            id: backup_id.to_string(),
            operation: OperationRef {
                name: format!("operations/import-{n}"),
            },
        })
    }

    async fn wait_for_completion(&self, operation_name: &str) -> Result<()> {
        if let Some(message) = injected(&self.wait_error) {
            return Err(RestoreError::ImportWait(message));
        }
        self.waited.lock().unwrap().push(operation_name.to_string());
        tokio::task::yield_now().await;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeReplayLauncher {
    launches: AtomicUsize,
    error: Mutex<Option<String>>,
}

impl FakeReplayLauncher {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl ReplayLauncher for FakeReplayLauncher {
    async fn launch(&self) -> Result<()> {
        if let Some(message) = injected(&self.error) {
            return Err(RestoreError::ReplayLaunch(message));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

