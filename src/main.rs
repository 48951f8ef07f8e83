//! Backup restore tool
//!
//! Restores a database from its latest completed backup, then launches the
//! replay of updates buffered since that backup was taken.

// restoretool/src/main.rs
mod catalog;
mod config;
mod errors;
mod import;
mod replay;
mod restore;
mod status;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use config::AppConfig;
use restore::RestoreOutcome;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run_app().await {
        Ok(_) => {
            tracing::info!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Usage: `restoretool [restore] [config.json]` or `restoretool status <tracking-id> [config.json]`.
async fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (command, rest) = match args.first().map(String::as_str) {
        Some("restore") | Some("status") => (args[0].as_str(), &args[1..]),
        _ => ("restore", &args[..]),
    };

    match command {
        "status" => {
            let tracking_id = rest
                .first()
                .context("status requires a tracking id")?;
            let app_config = load_config(rest.get(1))?;
            match restore::fetch_status(&app_config, tracking_id).await? {
                Some(record) if record.is_placeholder() => tracing::info!(
                    tracking_id = %tracking_id,
                    "restore attempt has not reached its first milestone"
                ),
                Some(record) => tracing::info!(
                    tracking_id = %tracking_id,
                    backup_id = record.id.as_deref().unwrap_or("-"),
                    status = record.status.as_deref().unwrap_or("-"),
                    operation = record.operation.as_deref().unwrap_or("-"),
                    timestamp = ?record.timestamp,
                    "restore status"
                ),
                None => anyhow::bail!("No restore attempt with tracking id {}", tracking_id),
            }
        }
        _ => {
            let app_config = load_config(rest.first())?;
            tracing::info!("🔄 Starting Restore Process...");
            let outcome = restore::run_restore_flow(&app_config)
                .await
                .context("Restore process failed")?;
            report(&outcome);
        }
    }
    Ok(())
}

fn load_config(path: Option<&String>) -> Result<AppConfig> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    AppConfig::load_from_json(&config_path).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            config_path.display()
        )
    })
}

// A recorded failure is still a successful invocation; the catalog entry is the signal.
fn report(outcome: &RestoreOutcome) {
    tracing::debug!(tracking_id = outcome.tracking_id(), state = %outcome.state(), "restore attempt ended");
    match outcome {
        RestoreOutcome::NoBackupFound { tracking_id } => {
            tracing::info!(%tracking_id, "nothing to restore");
        }
        RestoreOutcome::Completed {
            tracking_id,
            backup_id,
            operation,
        } => {
            tracing::info!(%tracking_id, %backup_id, %operation, "restore finished, replay job launched");
        }
        RestoreOutcome::Failed {
            tracking_id,
            failed_in,
            message,
        } => {
            tracing::warn!(%tracking_id, %failed_in, %message, "restore failed and was recorded in the backup catalog");
        }
    }
}
