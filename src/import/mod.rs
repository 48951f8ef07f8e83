//! Import service interface: start an import of a backup and wait for it to finish.

pub(crate) mod http;

use async_trait::async_trait;

use crate::errors::Result;

pub use http::HttpImportService;

/// Reference to the long-running operation performing an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRef {
    pub name: String,
}

/// Handle returned when an import is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOperation {
    /// Backup the import reads from.
    pub id: String,
    pub operation: OperationRef,
}

#[async_trait]
pub trait ImportService: Send + Sync {
    async fn create_import(&self, backup_id: &str) -> Result<ImportOperation>;

    /// Blocks until the named operation finishes; an operation that ends in error is a failure.
    async fn wait_for_completion(&self, operation_name: &str) -> Result<()>;
}
