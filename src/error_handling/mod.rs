//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for parsing, configuration, storage and ingestion
//! - Per-line failure categorization
//! - Thread-safe processing statistics shared by ingestion tasks
//!
//! Per-line failures (`ParseError`, non-fatal insert errors) are absorbed and
//! counted. Configuration and fatal store failures propagate to the caller.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ConfigError, ErrorType, IngestError, InitializationError, ParseError, StoreError,
};
