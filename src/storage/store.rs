//! Storage traits consumed by the ingestion and analysis pipeline.
//!
//! The pipeline only depends on these traits. Two implementations are provided:
//! - [`SqliteStore`](super::SqliteStore), durable, backed by a `sqlx` SQLite pool
//! - [`MemoryStore`](super::MemoryStore), in-process, for tests and embedding

use async_trait::async_trait;

use crate::error_handling::StoreError;
use crate::models::{AnalysisWindow, BlockDecision, LogRecord, Offender, StoredRecord};

/// Durable keyed storage of parsed access-log records.
///
/// Implementations must accept concurrent `insert` calls: the ingestion
/// worker pool writes from several tasks at once.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Number of records currently stored.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Removes every record.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Stores one record under a fresh surrogate id.
    async fn insert(&self, record: &LogRecord) -> Result<(), StoreError>;

    /// Per-IP request counts within `window` (both bounds included), keeping
    /// only the IPs whose count is strictly greater than `above`.
    ///
    /// The result order is unspecified.
    async fn count_by_ip_in_window(
        &self,
        window: &AnalysisWindow,
        above: u64,
    ) -> Result<Vec<Offender>, StoreError>;

    /// Every stored record, in insertion id order.
    async fn records(&self) -> Result<Vec<StoredRecord>, StoreError>;
}

/// Storage of the current block list.
#[async_trait]
pub trait BlockStore: Send + Sync + 'static {
    /// Removes every block-list entry.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Persists one block decision.
    async fn insert(&self, decision: &BlockDecision) -> Result<(), StoreError>;

    /// Every persisted block decision, in insertion order.
    async fn list(&self) -> Result<Vec<BlockDecision>, StoreError>;
}
