// restoretool/src/status/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{StatusRecord, StatusStore, StatusUpdate};
use crate::errors::{RestoreError, Result};

#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
    table: String,
}

impl PgStatusStore {
    /// `table` must already have passed identifier validation.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        PgStatusStore {
            pool,
            table: table.into(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let create_sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                tracking_id TEXT PRIMARY KEY,
                backup_id TEXT,
                status TEXT,
                operation TEXT,
                "timestamp" TIMESTAMPTZ
            )"#,
            self.table
        );
        sqlx::query(&create_sql).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn fetch(&self, tracking_id: &str) -> Result<Option<StatusRecord>> {
        let select_sql = format!(
            r#"SELECT backup_id, status, operation, "timestamp" FROM "{}" WHERE tracking_id = $1"#,
            self.table
        );
        let row = sqlx::query_as::<
            _,
            (Option<String>, Option<String>, Option<String>, Option<DateTime<Utc>>),
        >(&select_sql)
        .bind(tracking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, status, operation, timestamp)| StatusRecord {
            id,
            status,
            operation,
            timestamp,
        }))
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn create(&self, tracking_id: &str) -> Result<()> {
        let insert_sql = format!(r#"INSERT INTO "{}" (tracking_id) VALUES ($1)"#, self.table);
        sqlx::query(&insert_sql)
            .bind(tracking_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RestoreError::StatusWrite(e.to_string()))?;
        Ok(())
    }

    async fn overwrite(&self, tracking_id: &str, update: &StatusUpdate) -> Result<()> {
        let upsert_sql = format!(
            r#"INSERT INTO "{}" (tracking_id, backup_id, status, operation, "timestamp")
               VALUES ($1, $2, $3, $4, now())
               ON CONFLICT (tracking_id) DO UPDATE SET
                   backup_id = EXCLUDED.backup_id,
                   status = EXCLUDED.status,
                   operation = EXCLUDED.operation,
                   "timestamp" = EXCLUDED."timestamp""#,
            self.table
        );
        sqlx::query(&upsert_sql)
            .bind(tracking_id)
            .bind(&update.backup_id)
            .bind(&update.status)
            .bind(&update.operation)
            .execute(&self.pool)
            .await
            .map_err(|e| RestoreError::StatusWrite(e.to_string()))?;
        Ok(())
    }
}
