// restoretool/src/catalog/postgres.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{BackupCatalog, BackupEntry, BackupStatus, NewBackupEntry};
use crate::errors::Result;

/// Catalog stored in a Postgres table; timestamps come from the server's `now()`.
#[derive(Debug, Clone)]
pub struct PgBackupCatalog {
    pool: PgPool,
    table: String,
}

impl PgBackupCatalog {
    /// `table` must already have passed identifier validation.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Self {
        PgBackupCatalog {
            pool,
            table: table.into(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let create_sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                "timestamp" TIMESTAMPTZ NOT NULL DEFAULT now(),
                error TEXT
            )"#,
            table = self.table
        );
        sqlx::query(&create_sql).execute(&self.pool).await?;

        let index_sql = format!(
            r#"CREATE INDEX IF NOT EXISTS "{table}_status_idx" ON "{table}" (status, "timestamp" DESC)"#,
            table = self.table
        );
        sqlx::query(&index_sql).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BackupCatalog for PgBackupCatalog {
    async fn list_completed(&self) -> Result<Vec<BackupEntry>> {
        let select_sql = format!(
            r#"SELECT id, status, "timestamp", error FROM "{}" WHERE status = $1"#,
            self.table
        );
        let rows = sqlx::query_as::<_, (String, String, DateTime<Utc>, Option<String>)>(&select_sql)
            .bind(BackupStatus::Completed.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, status, timestamp, error)| BackupEntry {
                id,
                status: BackupStatus::from(status),
                timestamp,
                error,
            })
            .collect())
    }

    async fn append(&self, entry: NewBackupEntry) -> Result<BackupEntry> {
        let id = Uuid::new_v4().to_string();
        let insert_sql = format!(
            r#"INSERT INTO "{}" (id, status, "timestamp", error) VALUES ($1, $2, now(), $3) RETURNING "timestamp""#,
            self.table
        );
        let timestamp: DateTime<Utc> = sqlx::query_scalar(&insert_sql)
            .bind(&id)
            .bind(entry.status.as_str())
            .bind(entry.error.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(BackupEntry {
            id,
            status: entry.status,
            timestamp,
            error: entry.error,
        })
    }
}
