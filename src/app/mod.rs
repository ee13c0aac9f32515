//! Run-time helpers shared by the ingestion pipeline and the run orchestrator.
//!
//! This module provides progress logging, shutdown of background tasks and
//! end-of-run statistics printing.

pub mod logging;
pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use logging::log_progress;
pub use shutdown::shutdown_gracefully;
pub use statistics::print_error_statistics;
