//! Application initialization.
//!
//! The database pool is set up by the storage layer; this module only
//! configures logging.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
