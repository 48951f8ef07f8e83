// restoretool/src/restore/selector.rs
use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::{BackupCatalog, BackupEntry};
use crate::errors::Result;

/// Picks the backup a restore starts from.
#[derive(Clone)]
pub struct BackupSelector {
    catalog: Arc<dyn BackupCatalog>,
}

impl BackupSelector {
    pub fn new(catalog: Arc<dyn BackupCatalog>) -> Self {
        BackupSelector { catalog }
    }

    /// Most recent `Completed` entry, or `None` when no backup has completed yet.
    /// Catalog errors surface as `BackupLookup`.
    pub async fn select_latest_completed_backup(&self) -> Result<Option<BackupEntry>> {
        let entries = self
            .catalog
            .list_completed()
            .await
            .map_err(|e| e.into_lookup_failure())?;
        Ok(latest_completed(entries))
    }
}

/// Greatest timestamp wins; identical timestamps fall back to the greatest id.
pub fn latest_completed(entries: impl IntoIterator<Item = BackupEntry>) -> Option<BackupEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.status.is_completed())
        .max_by(compare_recency)
}

fn compare_recency(a: &BackupEntry, b: &BackupEntry) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RestoreError;
    use crate::testing::{entry, InMemoryBackupCatalog};

    #[test]
    fn test_latest_completed_ignores_newer_failures() {
        let entries = vec![
            entry("e1", "Completed", 100),
            entry("e2", "Completed", 200),
            entry("e3", "Failed", 300),
        ];

        assert_eq!(latest_completed(entries).unwrap().id, "e2");
    }

    #[test]
    fn test_latest_completed_ignores_in_progress_labels() {
        let entries = vec![
            entry("old", "Completed", 100),
            entry("running", "Running export...", 500),
        ];

        assert_eq!(latest_completed(entries).unwrap().id, "old");
    }

    #[test]
    fn test_latest_completed_is_order_independent() {
        let mut entries = vec![
            entry("a", "Completed", 300),
            entry("b", "Completed", 100),
            entry("c", "Completed", 200),
        ];
        assert_eq!(latest_completed(entries.clone()).unwrap().id, "a");
        entries.reverse();
        assert_eq!(latest_completed(entries).unwrap().id, "a");
    }

    #[test]
    fn test_identical_timestamps_pick_greatest_id() {
        let forward = vec![
            entry("backup-a", "Completed", 100),
            entry("backup-c", "Completed", 100),
            entry("backup-b", "Completed", 100),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(latest_completed(forward).unwrap().id, "backup-c");
        assert_eq!(latest_completed(backward).unwrap().id, "backup-c");
    }

    #[test]
    fn test_no_completed_entries_selects_nothing() {
        assert!(latest_completed(Vec::new()).is_none());
        assert!(latest_completed(vec![entry("f", "Failed", 10)]).is_none());
    }

    #[tokio::test]
    async fn test_selector_reads_catalog() {
        let catalog = Arc::new(InMemoryBackupCatalog::with_entries(vec![
            entry("e1", "Completed", 100),
            entry("e2", "Completed", 200),
            entry("e3", "Failed", 300),
        ]));
        let selector = BackupSelector::new(catalog);

        let selected = selector.select_latest_completed_backup().await.unwrap();
        assert_eq!(selected.map(|e| e.id).as_deref(), Some("e2"));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_lookup_failure() {
        let catalog = Arc::new(InMemoryBackupCatalog::default());
        catalog.fail_lookups("connection reset");
        let selector = BackupSelector::new(catalog);

        let err = selector.select_latest_completed_backup().await.unwrap_err();
        assert!(matches!(err, RestoreError::BackupLookup(ref m) if m.contains("connection reset")));
    }
}
