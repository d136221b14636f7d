//! Access to a project's own log database.
//!
//! Each project points at a Postgres database it controls. Error records
//! live in its `errors` table, which the ingest path creates on first write.
//! Reads return rows as raw JSON documents so user-managed columns flow into
//! the lenient [`openerr_core::log_record::ErrorLogRecord`] parser.
//!
//! The traits here are the seam between handlers and the database:
//! production wires [`PgSourceCache`], tests wire an in-memory connector.

use std::sync::Arc;

use async_trait::async_trait;
use openerr_core::source_errors::{
    friendly_source_message, MSG_ACCESS_DENIED, MSG_INVALID_URI, MSG_NO_LOGS, MSG_TIMEOUT,
};
use openerr_core::types::Timestamp;
use serde_json::Value;

mod cache;
mod pg;

pub use cache::PgSourceCache;
pub use pg::PgLogSource;

/// Name of the table holding error records in a project's database.
pub const ERRORS_TABLE: &str = "errors";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LogSourceError {
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("connection timed out")]
    Timeout,

    #[error("missing table: errors")]
    MissingTable,

    #[error("query failed: {0}")]
    Query(String),
}

impl LogSourceError {
    /// Wording safe to show the project owner.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidUri(_) => MSG_INVALID_URI,
            Self::AccessDenied(_) => MSG_ACCESS_DENIED,
            Self::Timeout => MSG_TIMEOUT,
            Self::MissingTable => MSG_NO_LOGS,
            Self::Connect(detail) | Self::Query(detail) => friendly_source_message(detail),
        }
    }
}

/// Postgres SQLSTATE: undefined_table.
const UNDEFINED_TABLE: &str = "42P01";
/// Postgres SQLSTATE: invalid_password.
const INVALID_PASSWORD: &str = "28P01";
/// Postgres SQLSTATE: invalid_authorization_specification.
const INVALID_AUTHORIZATION: &str = "28000";

impl From<sqlx::Error> for LogSourceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(UNDEFINED_TABLE) => Self::MissingTable,
                Some(INVALID_PASSWORD) | Some(INVALID_AUTHORIZATION) => {
                    Self::AccessDenied(db_err.message().to_string())
                }
                _ => Self::Query(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => Self::Timeout,
            sqlx::Error::Configuration(detail) => Self::InvalidUri(detail.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                Self::Connect(err.to_string())
            }
            _ => Self::Query(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One record to append to a project's `errors` table.
#[derive(Debug, Clone)]
pub struct NewErrorLog {
    pub error_type: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub url: Option<String>,
    pub metadata: Option<Value>,
    /// Set by the server at ingest time.
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An open handle to one project's log database.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Up to `limit` rows, newest first, as JSON documents.
    async fn fetch_recent(&self, limit: i64) -> Result<Vec<Value>, LogSourceError>;

    /// Append records, creating the table if needed. Returns rows written.
    async fn insert(&self, entries: &[NewErrorLog]) -> Result<u64, LogSourceError>;

    /// Liveness check.
    async fn ping(&self) -> Result<(), LogSourceError>;
}

/// Resolves a connection string to a [`LogSource`].
#[async_trait]
pub trait LogSourceConnector: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn LogSource>, LogSourceError>;

    /// Drop any cached handle for `uri`. Returns `true` if one was held.
    async fn invalidate(&self, _uri: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pool_timeout_maps_to_timeout() {
        assert_matches!(
            LogSourceError::from(sqlx::Error::PoolTimedOut),
            LogSourceError::Timeout
        );
    }

    #[test]
    fn io_error_maps_to_connect() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = LogSourceError::from(sqlx::Error::Io(io));
        assert_matches!(err, LogSourceError::Connect(_));
        assert_eq!(
            err.user_message(),
            "Database connection refused. Please check if your database is running."
        );
    }

    #[test]
    fn row_not_found_is_a_query_error() {
        assert_matches!(
            LogSourceError::from(sqlx::Error::RowNotFound),
            LogSourceError::Query(_)
        );
    }

    #[test]
    fn user_messages_per_variant() {
        assert_eq!(LogSourceError::MissingTable.user_message(), MSG_NO_LOGS);
        assert_eq!(LogSourceError::Timeout.user_message(), MSG_TIMEOUT);
        assert_eq!(
            LogSourceError::InvalidUri("bad".into()).user_message(),
            MSG_INVALID_URI
        );
        assert_eq!(
            LogSourceError::AccessDenied("no".into()).user_message(),
            MSG_ACCESS_DENIED
        );
        assert_eq!(
            LogSourceError::Query("something odd".into()).user_message(),
            openerr_core::source_errors::MSG_FALLBACK
        );
    }

    #[test]
    fn missing_table_message_names_the_table() {
        assert_eq!(LogSourceError::MissingTable.to_string(), "missing table: errors");
    }
}
