//! Record and block-list persistence.
//!
//! Storage traits, the SQLite and in-memory adapters, and database setup.

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod sqlite;
pub mod store;
#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used items
pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use sqlite::SqliteStore;
pub use store::{BlockStore, RecordStore};
