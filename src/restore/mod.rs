pub(crate) mod orchestrator;
pub(crate) mod selector;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::PgBackupCatalog;
use crate::config::AppConfig;
use crate::import::HttpImportService;
use crate::replay::HttpReplayLauncher;
use crate::status::{PgStatusStore, StatusRecord};
use crate::utils::clock::SystemClock;
use crate::utils::setting::check_db_connection;

pub use orchestrator::{ImportOrchestrator, RestoreOutcome};

async fn connect(app_config: &AppConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&app_config.database_url)
        .await
        .context("Failed to connect to the restore state database")
}

/// Public entry point for the restore process.
/// Wires the Postgres stores and HTTP services from configuration and runs one attempt.
pub async fn run_restore_flow(app_config: &AppConfig) -> Result<RestoreOutcome> {
    let pool = connect(app_config).await?;
    check_db_connection(&pool).await?;

    let catalog = PgBackupCatalog::new(pool.clone(), &app_config.catalog.exports_table);
    let status_store = PgStatusStore::new(pool, &app_config.catalog.imports_table);
    catalog
        .ensure_schema()
        .await
        .context("Failed to prepare backup catalog table")?;
    status_store
        .ensure_schema()
        .await
        .context("Failed to prepare restore status table")?;

    let importer = HttpImportService::new(
        app_config.import_service.clone(),
        app_config.access_token.clone(),
    )
    .context("Failed to build import service client")?;
    let replay = HttpReplayLauncher::new(
        app_config.replay_job.clone(),
        app_config.access_token.clone(),
        Arc::new(SystemClock),
    )
    .context("Failed to build replay job client")?;

    let orchestrator = ImportOrchestrator::new(
        Arc::new(catalog),
        Arc::new(status_store),
        Arc::new(importer),
        Arc::new(replay),
    );
    let outcome = orchestrator.run_restore().await?;
    Ok(outcome)
}

/// Looks up the progress record of an earlier restore attempt.
pub async fn fetch_status(app_config: &AppConfig, tracking_id: &str) -> Result<Option<StatusRecord>> {
    let pool = connect(app_config).await?;
    let status_store = PgStatusStore::new(pool, &app_config.catalog.imports_table);
    let record = status_store
        .fetch(tracking_id)
        .await
        .with_context(|| format!("Failed to read status record {}", tracking_id))?;
    Ok(record)
}
