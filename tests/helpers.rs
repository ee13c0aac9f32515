// Shared test helpers for access-log fixtures and database setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::io::Write;
use std::path::{Path, PathBuf};

use access_guard::{AnalysisMode, Config, SqliteStore};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

/// 2017-01-01 at the given time of day.
#[allow(dead_code)] // Used by other test files
pub fn at(hour: u32, minute: u32, second: u32, milli: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .unwrap()
        .and_hms_milli_opt(hour, minute, second, milli)
        .unwrap()
}

/// One access-log line for `ip` at `timestamp`.
#[allow(dead_code)]
pub fn line(ip: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}|{}|\"GET / HTTP/1.1\"|200|\"swcd (unknown version) CFNetwork/808.2.16 Darwin/15.6.0\"",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        ip
    )
}

/// Writes `lines` to `access.log` inside `dir`, newline-terminated.
#[allow(dead_code)]
pub fn write_log(dir: &Path, lines: &[String]) -> PathBuf {
    let path = dir.join("access.log");
    let mut file = std::fs::File::create(&path).expect("Failed to create access log");
    for line in lines {
        writeln!(file, "{line}").expect("Failed to write access log");
    }
    path
}

/// An hourly config starting at 13:00 with the database inside `dir`.
#[allow(dead_code)]
pub fn hourly_config(dir: &TempDir, access_log: PathBuf, threshold: u64) -> Config {
    Config {
        access_log,
        mode: AnalysisMode::Hourly,
        start: at(13, 0, 0, 0),
        threshold,
        db_path: dir.path().join("access_guard.db"),
        ..Default::default()
    }
}

/// Opens the run's database for inspection.
#[allow(dead_code)]
pub async fn open_store(db_path: &Path) -> SqliteStore {
    let pool = access_guard::storage::init_db_pool_with_path(db_path)
        .await
        .expect("Failed to open database");
    access_guard::storage::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    SqliteStore::new(pool)
}
