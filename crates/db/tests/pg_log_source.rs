//! Integration tests for the Postgres log source.
//!
//! The migrated test database doubles as a project's log database; the
//! `errors` table does not exist until the first insert.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use openerr_core::insights::aggregate_documents;
use openerr_core::log_record::ErrorLogRecord;
use openerr_db::log_source::{LogSource, LogSourceError, NewErrorLog, PgLogSource};
use serde_json::json;
use sqlx::PgPool;

fn entry(error_type: &str, minutes_ago: i64) -> NewErrorLog {
    NewErrorLog {
        error_type: error_type.to_string(),
        message: format!("{error_type} happened"),
        stack_trace: Some("at main.js:1:1".to_string()),
        url: Some("https://app.example.com/".to_string()),
        metadata: Some(json!({
            "environment": "production",
            "browser": {"name": "Chrome", "version": "120"},
            "device": {"type": "desktop"},
            "performance": {"fetch": 120, "long_task": 40}
        })),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_before_first_insert_reports_missing_table(pool: PgPool) {
    let source = PgLogSource::from_pool(pool);

    let result = source.fetch_recent(10).await;

    assert_matches!(result, Err(LogSourceError::MissingTable));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_creates_table_and_fetch_returns_newest_first(pool: PgPool) {
    let source = PgLogSource::from_pool(pool);

    let written = source
        .insert(&[entry("TypeError", 30), entry("FatalCrash", 5), entry("Warning", 60)])
        .await
        .unwrap();
    assert_eq!(written, 3);

    let docs = source.fetch_recent(10).await.unwrap();
    let records: Vec<ErrorLogRecord> = docs
        .iter()
        .map(|d| ErrorLogRecord::from_document(d).unwrap())
        .collect();

    let types: Vec<_> = records
        .iter()
        .map(|r| r.error_type.as_deref().unwrap())
        .collect();
    assert_eq!(types, vec!["FatalCrash", "TypeError", "Warning"]);

    let first = &records[0];
    assert_eq!(first.message.as_deref(), Some("FatalCrash happened"));
    assert_eq!(first.stack_trace.as_deref(), Some("at main.js:1:1"));
    assert!(first.timestamp.is_some());
    assert!(first.id.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_respects_limit(pool: PgPool) {
    let source = PgLogSource::from_pool(pool);
    let entries: Vec<_> = (0..5).map(|i| entry("Error", i)).collect();
    source.insert(&entries).await.unwrap();

    assert_eq!(source.fetch_recent(2).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetched_rows_aggregate(pool: PgPool) {
    let source = PgLogSource::from_pool(pool);
    source
        .insert(&[entry("TypeError", 1), entry("TypeError", 2)])
        .await
        .unwrap();

    let insights = aggregate_documents(&source.fetch_recent(100).await.unwrap()).unwrap();

    assert_eq!(insights.total_errors, 2);
    assert_eq!(insights.error_types["TypeError"], 2);
    assert_eq!(insights.environments["production"], 2);
    assert_eq!(insights.browsers["Chrome 120"], 2);
    assert_eq!(insights.devices["desktop"], 2);
    assert_eq!(insights.performance_metrics.avg_load_time, 120.0);
    assert_eq!(insights.performance_metrics.avg_response_time, 40.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_user_managed_table_layout_is_read_leniently(pool: PgPool) {
    sqlx::query(
        r#"CREATE TABLE errors (
            "_id" TEXT,
            "errorType" TEXT,
            "message" TEXT,
            "stackTrace" TEXT,
            "timestamp" BIGINT,
            "metadata" JSONB
        )"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
    sqlx::query(
        r#"INSERT INTO errors ("_id", "errorType", "message", "timestamp", "metadata")
           VALUES ('abc', 'NetworkError', 'offline', $1, '{"environment": "staging"}')"#,
    )
    .bind(ts.timestamp_millis())
    .execute(&pool)
    .await
    .unwrap();

    let source = PgLogSource::from_pool(pool);
    let docs = source.fetch_recent(10).await.unwrap();
    let record = ErrorLogRecord::from_document(&docs[0]).unwrap();

    assert_eq!(record.id.as_deref(), Some("abc"));
    assert_eq!(record.error_type.as_deref(), Some("NetworkError"));
    assert_eq!(record.timestamp, Some(ts));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_epoch_timestamps_order_numerically(pool: PgPool) {
    sqlx::query(r#"CREATE TABLE errors ("errorType" TEXT, "timestamp" BIGINT)"#)
        .execute(&pool)
        .await
        .unwrap();
    // As text, "999" would sort above "1000".
    sqlx::query(
        r#"INSERT INTO errors ("errorType", "timestamp")
           VALUES ('Older', 999), ('Newer', 1000), ('Undated', NULL)"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let source = PgLogSource::from_pool(pool);
    let docs = source.fetch_recent(2).await.unwrap();

    let types: Vec<_> = docs.iter().map(|d| d["errorType"].clone()).collect();
    assert_eq!(types, vec![json!("Newer"), json!("Older")]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_creates_timestamp_index(pool: PgPool) {
    let source = PgLogSource::from_pool(pool.clone());
    source.insert(&[entry("TypeError", 1)]).await.unwrap();

    let (found,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM pg_indexes
                        WHERE tablename = 'errors' AND indexname = 'idx_errors_timestamp')",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(found);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ping(pool: PgPool) {
    let source = PgLogSource::from_pool(pool);
    source.ping().await.unwrap();
}
