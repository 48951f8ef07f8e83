// Store connectivity
use anyhow::{Context, Result};
use sqlx::PgPool;

/// Runs a trivial query so an unreachable store fails the run before any record is written.
pub async fn check_db_connection(pool: &PgPool) -> Result<()> {
    let one: i32 = sqlx::query_scalar("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to reach the restore state database")?;
    if one != 1 {
        anyhow::bail!("Unexpected response from connectivity check: {}", one);
    }
    tracing::info!("✅ Connected to restore state database");
    Ok(())
}
