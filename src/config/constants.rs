//! Configuration constants.
//!
//! This module defines the constants used throughout the application, including
//! input formats, worker pool defaults and logging intervals.

use std::time::Duration;

/// Default number of concurrent insert tasks in the ingestion worker pool.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Seconds between progress log lines while ingesting.
pub const LOGGING_INTERVAL: usize = 5;

/// Default database path (SQLite file).
pub const DB_PATH: &str = "./access_guard.db";

/// Maximum connections held by the SQLite pool.
///
/// Kept above the default worker pool size so that every in-flight insert can
/// hold a connection while the analyzer still has one available.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// How long a writer waits on a locked SQLite database before giving up.
///
/// SQLite allows a single writer at a time; concurrent inserts queue behind
/// this timeout instead of failing with `SQLITE_BUSY`.
pub const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Field delimiter of the access log.
pub const LOG_FIELD_DELIMITER: char = '|';

/// `chrono` pattern for the access-log timestamp (`yyyy-MM-dd HH:mm:ss.SSS`).
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%3f";

/// `chrono` pattern for the analysis window start (`yyyy-MM-dd.HH:mm:ss`).
pub const START_DATE_FORMAT: &str = "%Y-%m-%d.%H:%M:%S";

/// Upper bound on offending lines kept verbatim in an ingestion summary.
/// Failures past this limit are still counted.
pub const MAX_REPORTED_FAILED_LINES: usize = 100;
