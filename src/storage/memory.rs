//! In-memory record and block-list store.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error_handling::StoreError;
use crate::models::{AnalysisWindow, BlockDecision, LogRecord, Offender, StoredRecord};
use crate::storage::store::{BlockStore, RecordStore};

/// Process-local store implementing both [`RecordStore`] and [`BlockStore`].
///
/// Inserts are serialized through a mutex, so concurrent callers are safe.
/// [`MemoryStore::mark_unavailable`] simulates a lost backend: every later call
/// fails with a fatal [`StoreError::Unavailable`].
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
    blocks: Mutex<Vec<BlockDecision>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail as if the backend were gone.
    pub fn mark_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, Vec<StoredRecord>>, StoreError> {
        self.check_available()?;
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".into()))
    }

    fn lock_blocks(&self) -> Result<MutexGuard<'_, Vec<BlockDecision>>, StoreError> {
        self.check_available()?;
        self.blocks
            .lock()
            .map_err(|_| StoreError::Unavailable("block list lock poisoned".into()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock_records()?.len() as u64)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.lock_records()?.clear();
        Ok(())
    }

    async fn insert(&self, record: &LogRecord) -> Result<(), StoreError> {
        let mut records = self.lock_records()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        records.push(StoredRecord {
            id,
            record: record.clone(),
        });
        Ok(())
    }

    async fn count_by_ip_in_window(
        &self,
        window: &AnalysisWindow,
        above: u64,
    ) -> Result<Vec<Offender>, StoreError> {
        let records = self.lock_records()?;
        let mut hits: std::collections::HashMap<&str, u64> = std::collections::HashMap::new();
        for stored in records
            .iter()
            .filter(|s| window.contains(&s.record.timestamp))
        {
            *hits.entry(stored.record.ip.as_str()).or_default() += 1;
        }
        Ok(hits
            .into_iter()
            .filter(|(_, count)| *count > above)
            .map(|(ip, count)| Offender {
                ip: ip.to_string(),
                count,
            })
            .collect())
    }

    async fn records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.lock_records()?.clone())
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn delete_all(&self) -> Result<(), StoreError> {
        self.lock_blocks()?.clear();
        Ok(())
    }

    async fn insert(&self, decision: &BlockDecision) -> Result<(), StoreError> {
        self.lock_blocks()?.push(decision.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<BlockDecision>, StoreError> {
        Ok(self.lock_blocks()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{record_at, ts};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_store_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let record = record_at("10.0.0.1", ts(13, 0, 0, 0));
        RecordStore::insert(&store, &record).await.unwrap();
        RecordStore::insert(&store, &record).await.unwrap();

        let stored = RecordStore::records(&store).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].id, stored[1].id);
    }

    #[tokio::test]
    async fn test_memory_store_window_and_threshold() {
        let store = MemoryStore::new();
        let window = AnalysisWindow::new(ts(13, 0, 0, 0), ts(14, 0, 0, 0));
        for at in [ts(13, 0, 0, 0), ts(14, 0, 0, 0), ts(14, 0, 0, 1)] {
            RecordStore::insert(&store, &record_at("a", at)).await.unwrap();
        }
        RecordStore::insert(&store, &record_at("b", ts(13, 5, 0, 0)))
            .await
            .unwrap();

        let mut hits = store.count_by_ip_in_window(&window, 0).await.unwrap();
        hits.sort_by(|x, y| x.ip.cmp(&y.ip));
        assert_eq!(
            hits,
            vec![
                Offender { ip: "a".into(), count: 2 },
                Offender { ip: "b".into(), count: 1 },
            ]
        );

        let over_one = store.count_by_ip_in_window(&window, 1).await.unwrap();
        assert_eq!(over_one, vec![Offender { ip: "a".into(), count: 2 }]);
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_inserts() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..100u32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                RecordStore::insert(store.as_ref(), &record_at("c", ts(13, i % 60, 0, 0))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_memory_store_unavailable_is_fatal() {
        let store = MemoryStore::new();
        store.mark_unavailable();
        let err = store.count().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(BlockStore::list(&store).await.is_err());
    }
}
