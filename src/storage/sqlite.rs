//! SQLite-backed record and block-list store.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::error_handling::StoreError;
use crate::models::{
    format_local_datetime, from_millis, to_millis, AnalysisWindow, BlockDecision, LogRecord,
    Offender, StoredRecord,
};
use crate::storage::store::{BlockStore, RecordStore};

/// Durable store over the `log_record` and `blocked_ip` tables.
///
/// Timestamps are stored as epoch milliseconds (`observed_at_ms`) so that the
/// window filter compares integers; the rendered form is kept alongside for
/// people reading the database directly.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    /// Wraps an initialized pool. Migrations must already have run.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        self.pool.as_ref()
    }
}

fn decode_millis(ms: i64, column: &str) -> Result<chrono::NaiveDateTime, StoreError> {
    from_millis(ms).ok_or_else(|| {
        StoreError::SqlError(sqlx::Error::Decode(
            format!("{column} value {ms} is out of range").into(),
        ))
    })
}

// SQLite integers are signed; counts never approach i64::MAX in practice
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_record")
            .fetch_one(self.pool())
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM log_record")
            .execute(self.pool())
            .await?;
        log::info!("Deleted {} stored log records", result.rows_affected());
        Ok(())
    }

    async fn insert(&self, record: &LogRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO log_record (observed_at_ms, timestamp, ip, request, response_code, client_info)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(to_millis(&record.timestamp))
        .bind(format_local_datetime(&record.timestamp))
        .bind(&record.ip)
        .bind(&record.request)
        .bind(&record.response_code)
        .bind(&record.client_info)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn count_by_ip_in_window(
        &self,
        window: &AnalysisWindow,
        above: u64,
    ) -> Result<Vec<Offender>, StoreError> {
        let rows = sqlx::query(
            "SELECT ip, COUNT(*) AS hits
             FROM log_record
             WHERE observed_at_ms BETWEEN ? AND ?
             GROUP BY ip
             HAVING COUNT(*) > ?",
        )
        .bind(window.start_ms())
        .bind(window.end_ms())
        .bind(to_i64(above))
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<Offender, StoreError> {
                let hits: i64 = row.try_get("hits")?;
                Ok(Offender {
                    ip: row.try_get("ip")?,
                    count: hits.max(0) as u64,
                })
            })
            .collect()
    }

    async fn records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, observed_at_ms, ip, request, response_code, client_info
             FROM log_record
             ORDER BY id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<StoredRecord, StoreError> {
                let observed_at_ms: i64 = row.try_get("observed_at_ms")?;
                Ok(StoredRecord {
                    id: row.try_get("id")?,
                    record: LogRecord {
                        timestamp: decode_millis(observed_at_ms, "observed_at_ms")?,
                        ip: row.try_get("ip")?,
                        request: row.try_get("request")?,
                        response_code: row.try_get("response_code")?,
                        client_info: row.try_get("client_info")?,
                    },
                })
            })
            .collect()
    }
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM blocked_ip")
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn insert(&self, decision: &BlockDecision) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO blocked_ip (ip, request_count, threshold, window_start_ms, window_end_ms, comments)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&decision.ip)
        .bind(to_i64(decision.count))
        .bind(to_i64(decision.threshold))
        .bind(to_millis(&decision.window_start))
        .bind(to_millis(&decision.window_end))
        .bind(&decision.comment)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<BlockDecision>, StoreError> {
        let rows = sqlx::query(
            "SELECT ip, request_count, threshold, window_start_ms, window_end_ms, comments
             FROM blocked_ip
             ORDER BY id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<BlockDecision, StoreError> {
                let count: i64 = row.try_get("request_count")?;
                let threshold: i64 = row.try_get("threshold")?;
                let start_ms: i64 = row.try_get("window_start_ms")?;
                let end_ms: i64 = row.try_get("window_end_ms")?;
                Ok(BlockDecision {
                    ip: row.try_get("ip")?,
                    count: count.max(0) as u64,
                    threshold: threshold.max(0) as u64,
                    window_start: decode_millis(start_ms, "window_start_ms")?,
                    window_end: decode_millis(end_ms, "window_end_ms")?,
                    comment: row.try_get("comments")?,
                })
            })
            .collect()
    }
}
