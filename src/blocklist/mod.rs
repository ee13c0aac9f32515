//! Persisted block list.

use std::sync::Arc;

use log::info;

use crate::error_handling::StoreError;
use crate::models::BlockDecision;
use crate::storage::BlockStore;

/// Replaces the stored block list with the decisions of the current run.
pub struct BlockListWriter {
    store: Arc<dyn BlockStore>,
}

impl BlockListWriter {
    /// Writer replacing the list held by `store`.
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        Self { store }
    }

    /// Clears the block list, then writes `decisions` in order.
    ///
    /// The list is cleared even when `decisions` is empty, so an IP blocked by
    /// an earlier run disappears once it no longer qualifies. Returns the number
    /// of entries written.
    pub async fn replace_block_list(&self, decisions: &[BlockDecision]) -> Result<usize, StoreError> {
        self.store.delete_all().await?;
        for decision in decisions {
            info!("Adding blocked ip[{}]: {}", decision.ip, decision.comment);
            self.store.insert(decision).await?;
        }
        Ok(decisions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisWindow;
    use crate::storage::test_helpers::{create_test_store, ts};
    use crate::storage::MemoryStore;

    fn decision(ip: &str, count: u64) -> BlockDecision {
        let window = AnalysisWindow::new(ts(13, 0, 0, 0), ts(14, 0, 0, 0));
        BlockDecision::new(ip, count, 100, &window)
    }

    #[tokio::test]
    async fn test_replace_overwrites_previous_list() {
        let store = Arc::new(MemoryStore::new());
        let writer = BlockListWriter::new(store.clone());

        let written = writer
            .replace_block_list(&[decision("a", 150), decision("b", 120)])
            .await
            .unwrap();
        assert_eq!(written, 2);

        writer.replace_block_list(&[decision("c", 101)]).await.unwrap();
        let list = BlockStore::list(store.as_ref()).await.unwrap();
        assert_eq!(list, vec![decision("c", 101)]);
    }

    #[tokio::test]
    async fn test_empty_run_clears_list() {
        let (store, _dir) = create_test_store().await;
        let store = Arc::new(store);
        let writer = BlockListWriter::new(store.clone());

        writer.replace_block_list(&[decision("a", 150)]).await.unwrap();
        let written = writer.replace_block_list(&[]).await.unwrap();

        assert_eq!(written, 0);
        assert!(BlockStore::list(store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = Arc::new(MemoryStore::new());
        store.mark_unavailable();
        let writer = BlockListWriter::new(store);
        assert!(writer.replace_block_list(&[decision("a", 150)]).await.is_err());
    }
}
