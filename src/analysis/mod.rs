//! Windowed request-frequency analysis.

use std::sync::Arc;

use log::info;

use crate::error_handling::StoreError;
use crate::models::{AnalysisWindow, BlockDecision, Offender};
use crate::storage::RecordStore;

/// Finds the IPs that made more requests than allowed within a window.
pub struct FrequencyAnalyzer {
    store: Arc<dyn RecordStore>,
}

impl FrequencyAnalyzer {
    /// Analyzer reading from `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// IPs whose request count within `window` (both bounds included) is
    /// strictly greater than `threshold`.
    ///
    /// Order is unspecified. Any store failure fails the whole query; there is
    /// no partial result.
    pub async fn find_offenders(
        &self,
        window: &AnalysisWindow,
        threshold: u64,
    ) -> Result<Vec<Offender>, StoreError> {
        info!(
            "Counting requests per IP during {} (threshold {})",
            window, threshold
        );
        let offenders = self.store.count_by_ip_in_window(window, threshold).await?;
        info!("Found {} IPs over the threshold", offenders.len());
        Ok(offenders)
    }

    /// [`find_offenders`](Self::find_offenders), rendered as block decisions.
    pub async fn block_decisions(
        &self,
        window: &AnalysisWindow,
        threshold: u64,
    ) -> Result<Vec<BlockDecision>, StoreError> {
        Ok(self
            .find_offenders(window, threshold)
            .await?
            .into_iter()
            .map(|offender| BlockDecision::new(offender.ip, offender.count, threshold, window))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisMode;
    use crate::storage::test_helpers::{record_at, ts};
    use crate::storage::MemoryStore;

    async fn store_with(hits: &[(&str, chrono::NaiveDateTime, usize)]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (ip, at, times) in hits {
            for _ in 0..*times {
                RecordStore::insert(store.as_ref(), &record_at(ip, *at))
                    .await
                    .unwrap();
            }
        }
        store
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        let store = store_with(&[("at", ts(13, 10, 0, 0), 100), ("over", ts(13, 20, 0, 0), 101)]).await;
        let analyzer = FrequencyAnalyzer::new(store);
        let window = AnalysisWindow::from_start(ts(13, 0, 0, 0), AnalysisMode::Hourly);

        let offenders = analyzer.find_offenders(&window, 100).await.unwrap();
        assert_eq!(
            offenders,
            vec![Offender {
                ip: "over".into(),
                count: 101
            }]
        );
    }

    #[tokio::test]
    async fn test_window_end_is_inclusive() {
        let store = store_with(&[
            ("edge", ts(14, 0, 0, 0), 2),
            ("late", ts(14, 0, 0, 1), 2),
        ])
        .await;
        let analyzer = FrequencyAnalyzer::new(store);
        let window = AnalysisWindow::from_start(ts(13, 0, 0, 0), AnalysisMode::Hourly);

        let offenders = analyzer.find_offenders(&window, 1).await.unwrap();
        assert_eq!(offenders.len(), 1);
        assert_eq!(offenders[0].ip, "edge");
    }

    #[tokio::test]
    async fn test_block_decisions_carry_comment() {
        let store = store_with(&[("1.2.3.4", ts(13, 30, 0, 0), 3)]).await;
        let analyzer = FrequencyAnalyzer::new(store);
        let window = AnalysisWindow::from_start(ts(13, 0, 0, 0), AnalysisMode::Hourly);

        let decisions = analyzer.block_decisions(&window, 2).await.unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].count, 3);
        assert_eq!(decisions[0].threshold, 2);
        assert_eq!(
            decisions[0].comment,
            "ip[1.2.3.4] is blocked! Because it made [3 over 2(allowed)] requests during 2017-01-01T13:00 to 2017-01-01T14:00"
        );
    }

    #[tokio::test]
    async fn test_no_offenders_on_empty_store() {
        let analyzer = FrequencyAnalyzer::new(Arc::new(MemoryStore::new()));
        let window = AnalysisWindow::from_start(ts(0, 0, 0, 0), AnalysisMode::Daily);
        assert!(analyzer.block_decisions(&window, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.mark_unavailable();
        let analyzer = FrequencyAnalyzer::new(store);
        let window = AnalysisWindow::from_start(ts(13, 0, 0, 0), AnalysisMode::Hourly);
        assert!(analyzer.find_offenders(&window, 0).await.is_err());
    }
}
