//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use std::path::PathBuf;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::config::AnalysisMode;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Why a single access-log line was rejected.
///
/// Always recoverable: the line is skipped, counted and logged, and the run
/// continues with the next line.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The line did not split into exactly five non-empty fields.
    #[error("expected 5 `|`-separated fields, found {found}")]
    FieldCount {
        /// Number of fields actually present
        found: usize,
    },

    /// The first field is not a `yyyy-MM-dd HH:mm:ss.SSS` timestamp.
    #[error("invalid timestamp `{value}`: {source}")]
    Timestamp {
        /// The rejected timestamp field
        value: String,
        /// Underlying chrono parse failure
        source: chrono::ParseError,
    },

    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8 (invalid byte at offset {valid_up_to})")]
    Encoding {
        /// Length of the valid UTF-8 prefix
        valid_up_to: usize,
    },
}

impl ParseError {
    /// The statistics bucket this failure is counted under.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ParseError::FieldCount { .. } => ErrorType::LineFieldCount,
            ParseError::Timestamp { .. } => ErrorType::LineTimestamp,
            ParseError::Encoding { .. } => ErrorType::LineEncoding,
        }
    }
}

/// Error types for invalid run configuration.
///
/// All variants are fatal and raised before any ingestion work begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `--duration` is neither `hourly` nor `daily`.
    #[error(
        "unknown analysis mode `{0}`: --duration must be one of: {modes}",
        modes = AnalysisMode::NAMES.join(", ")
    )]
    UnknownMode(String),

    /// `--startDate` does not match `yyyy-MM-dd.HH:mm:ss`.
    #[error("invalid --startDate `{value}` (expected yyyy-MM-dd.HH:mm:ss): {source}")]
    InvalidStartDate {
        /// The rejected value
        value: String,
        /// Underlying chrono parse failure
        source: chrono::ParseError,
    },

    /// The worker pool needs at least one task slot.
    #[error("--pool-size must be at least 1")]
    InvalidPoolSize,

    /// The access log does not exist.
    #[error("access log not found: {}", .0.display())]
    LogSourceMissing(PathBuf),

    /// The access log exists but cannot be read as a file.
    #[error("access log {} is not readable: {source}", .path.display())]
    LogSourceUnreadable {
        /// The configured log path
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

/// Error types for record and block-list storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// The store can no longer serve requests.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the store itself is unusable, as opposed to a single rejected operation.
    ///
    /// A fatal error aborts the run; a non-fatal one only loses the operation
    /// that raised it.
    pub fn is_fatal(&self) -> bool {
        match self {
            StoreError::SqlError(e) => matches!(
                e,
                sqlx::Error::PoolClosed
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::Configuration(_)
                    | sqlx::Error::WorkerCrashed
            ),
            StoreError::FileCreationError(_)
            | StoreError::MigrationError(_)
            | StoreError::Unavailable(_) => true,
        }
    }
}

/// Error types for an ingestion run.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The access log could not be read mid-run.
    #[error("Failed to read access log {}: {source}", .path.display())]
    Read {
        /// The log being ingested
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The record store failed fatally.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Types of per-line failures that can occur during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Line did not have exactly five fields
    LineFieldCount,
    /// Timestamp field did not match the log format
    LineTimestamp,
    /// Line bytes were not UTF-8
    LineEncoding,
    /// Store rejected a single record insert
    RecordInsert,
    /// Insert task panicked before reporting
    TaskPanicked,
}

impl ErrorType {
    /// Returns a human-readable string representation of the error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::LineFieldCount => "Malformed line (field count)",
            ErrorType::LineTimestamp => "Malformed line (timestamp)",
            ErrorType::LineEncoding => "Malformed line (encoding)",
            ErrorType::RecordInsert => "Record insert failed",
            ErrorType::TaskPanicked => "Insert task panicked",
        }
    }
}
