use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use super::{LogSource, LogSourceError, NewErrorLog};

/// Pool size per project database. Dashboards and ingest are bursty but
/// low-volume per project.
const MAX_CONNECTIONS: u32 = 5;

const CREATE_ERRORS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS errors (
    id           BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    error_type   TEXT NOT NULL,
    message      TEXT NOT NULL,
    stack_trace  TEXT,
    url          TEXT,
    metadata     JSONB,
    "timestamp"  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const CREATE_TIMESTAMP_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS idx_errors_timestamp ON errors ("timestamp" DESC NULLS LAST)"#;

/// Rows are limited on the native `timestamp` column, then read back
/// through `to_jsonb` so any other column layout parses.
const FETCH_RECENT: &str = r#"SELECT to_jsonb(recent) FROM (
                                  SELECT * FROM errors
                                  ORDER BY "timestamp" DESC NULLS LAST
                                  LIMIT $1
                              ) AS recent
                              ORDER BY recent."timestamp" DESC NULLS LAST"#;

const INSERT_ERROR: &str = r#"INSERT INTO errors (error_type, message, stack_trace, url, metadata, "timestamp")
                              VALUES ($1, $2, $3, $4, $5, $6)"#;

/// A project log database reached over its own small pool.
#[derive(Clone)]
pub struct PgLogSource {
    pool: PgPool,
}

impl PgLogSource {
    /// Open a pool for `uri`, failing if no connection is made within
    /// `connect_timeout`.
    pub async fn connect(uri: &str, connect_timeout: Duration) -> Result<Self, LogSourceError> {
        let options = PgConnectOptions::from_str(uri)
            .map_err(|e| LogSourceError::InvalidUri(e.to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(connect_timeout)
            .connect_with(options);

        match tokio::time::timeout(connect_timeout, pool).await {
            Ok(pool) => Ok(Self { pool: pool? }),
            Err(_) => Err(LogSourceError::Timeout),
        }
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LogSource for PgLogSource {
    async fn fetch_recent(&self, limit: i64) -> Result<Vec<Value>, LogSourceError> {
        let docs = sqlx::query_scalar::<_, Value>(FETCH_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }

    async fn insert(&self, entries: &[NewErrorLog]) -> Result<u64, LogSourceError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_ERRORS_TABLE).execute(&mut *tx).await?;
        sqlx::query(CREATE_TIMESTAMP_INDEX).execute(&mut *tx).await?;

        let mut written = 0;
        for entry in entries {
            let result = sqlx::query(INSERT_ERROR)
                .bind(&entry.error_type)
                .bind(&entry.message)
                .bind(&entry.stack_trace)
                .bind(&entry.url)
                .bind(&entry.metadata)
                .bind(entry.timestamp)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn ping(&self) -> Result<(), LogSourceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
