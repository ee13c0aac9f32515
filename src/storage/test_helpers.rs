//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across storage, ingestion and analysis tests.

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use crate::models::LogRecord;
use crate::storage::{init_db_pool_with_path, run_migrations, SqliteStore};

/// Creates a file-backed test store with migrations applied.
///
/// A temporary file is used instead of `sqlite::memory:` because every pooled
/// connection to an in-memory database sees its own empty database, which
/// breaks concurrent-insert tests. Keep the returned `TempDir` alive for the
/// duration of the test.
pub async fn create_test_store() -> (SqliteStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_db_pool_with_path(&dir.path().join("test.db"))
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    (SqliteStore::new(pool), dir)
}

/// 2017-01-01 at the given time of day.
pub fn ts(hour: u32, minute: u32, second: u32, milli: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .expect("valid date")
        .and_hms_milli_opt(hour, minute, second, milli)
        .expect("valid time")
}

/// A record for `ip` at `timestamp` with fixed request fields.
pub fn record_at(ip: &str, timestamp: NaiveDateTime) -> LogRecord {
    LogRecord {
        timestamp,
        ip: ip.to_string(),
        request: "\"GET / HTTP/1.1\"".to_string(),
        response_code: "200".to_string(),
        client_info: "\"test-agent\"".to_string(),
    }
}

/// Formats a record back into an access-log line.
pub fn log_line(ip: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}|{}|\"GET / HTTP/1.1\"|200|\"test-agent\"",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        ip
    )
}
