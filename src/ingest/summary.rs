//! Ingestion outcome types.

use crate::config::MAX_REPORTED_FAILED_LINES;

/// A line that did not make it into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLine {
    /// 1-based position in the log
    pub line_number: usize,
    /// The line as read, lossily decoded if it was not UTF-8
    pub line: String,
    /// Why the line was rejected
    pub reason: String,
}

/// What one ingestion pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Lines in the source, blank lines included
    pub lines_seen: usize,
    /// Records the store accepted
    pub records_stored: usize,
    /// Lines the parser rejected
    pub parse_failures: usize,
    /// Records the store refused, or whose insert task panicked
    pub insert_failures: usize,
    /// True when the store already held as many records as the log has lines
    pub skipped: bool,
    /// First failures, capped at [`MAX_REPORTED_FAILED_LINES`]
    pub failed_lines: Vec<FailedLine>,
}

impl IngestionSummary {
    pub(crate) fn new(lines_seen: usize) -> Self {
        Self {
            lines_seen,
            ..Default::default()
        }
    }

    pub(crate) fn skipped(lines_seen: usize) -> Self {
        Self {
            lines_seen,
            skipped: true,
            ..Default::default()
        }
    }

    /// Lines rejected by the parser plus records the store refused.
    pub fn records_failed(&self) -> usize {
        self.parse_failures + self.insert_failures
    }

    pub(crate) fn record_parse_failure(&mut self, line_number: usize, line: &str, reason: String) {
        self.parse_failures += 1;
        self.sample_failure(line_number, line, reason);
    }

    pub(crate) fn record_insert_failure(&mut self, line_number: usize, line: &str, reason: String) {
        self.insert_failures += 1;
        self.sample_failure(line_number, line, reason);
    }

    fn sample_failure(&mut self, line_number: usize, line: &str, reason: String) {
        if self.failed_lines.len() < MAX_REPORTED_FAILED_LINES {
            self.failed_lines.push(FailedLine {
                line_number,
                line: line.to_string(),
                reason,
            });
        }
    }
}
