//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};
use crate::ingest::IngestionSummary;

/// Prints per-category failure counts to the log.
///
/// Categories with a zero count are omitted; nothing is printed for a clean run.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();

    if total_errors > 0 {
        info!("Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }
}

/// Prints a one-line summary of an ingestion pass.
pub fn print_ingestion_summary(summary: &IngestionSummary, elapsed_seconds: f64) {
    if summary.skipped {
        info!(
            "Store already holds {} records, skipping ingestion",
            summary.lines_seen
        );
        return;
    }
    info!(
        "Ingested {} line{} ({} stored, {} failed) in {:.1}s",
        summary.lines_seen,
        if summary.lines_seen == 1 { "" } else { "s" },
        summary.records_stored,
        summary.records_failed(),
        elapsed_seconds
    );
}
