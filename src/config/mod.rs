//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (pool sizes, intervals, formats)
//! - CLI option types and parsing
//! - Validation of raw options into a run [`Config`]

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{parse_window_start, AnalysisMode, Config, LogFormat, LogLevel, Opt};
