//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Logs progress information about line ingestion.
///
/// # Arguments
///
/// * `start_time` - The start time of ingestion
/// * `dispatched` - Atomic counter of lines handed to the pipeline
/// * `total_lines` - Number of lines in the log
pub fn log_progress(
    start_time: std::time::Instant,
    dispatched: &Arc<AtomicUsize>,
    total_lines: usize,
) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let processed = dispatched.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        processed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {}/{} lines in {:.2} seconds (~{:.2} lines/sec)",
        processed, total_lines, elapsed_secs, rate
    );
}
