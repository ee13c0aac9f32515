//! Record and decision types shared by ingestion, analysis and storage.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::config::AnalysisMode;

/// One normalized access-log entry.
///
/// Immutable once parsed. There is no natural key: two identical lines are two
/// distinct requests and are stored twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the request was served, millisecond precision
    pub timestamp: NaiveDateTime,
    /// Client address, not validated
    pub ip: String,
    /// Raw request line, quotes included
    pub request: String,
    /// Kept as text so malformed codes still round-trip
    pub response_code: String,
    /// Raw user-agent, quotes included
    pub client_info: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogRecord[timestamp={}, ip={}, request={}, responseCode={}, clientInfo={}]",
            format_local_datetime(&self.timestamp),
            self.ip,
            self.request,
            self.response_code,
            self.client_info
        )
    }
}

/// A [`LogRecord`] together with the surrogate id its store assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Surrogate key, unique within one store
    pub id: i64,
    /// The stored entry
    pub record: LogRecord,
}

/// An IP and its request count within a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offender {
    /// Client address
    pub ip: String,
    /// Requests within the window
    pub count: u64,
}

/// Closed time interval `[start, end]` over which requests are counted per IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    /// First instant counted
    pub start: NaiveDateTime,
    /// Last instant counted
    pub end: NaiveDateTime,
}

impl AnalysisWindow {
    /// Window over `[start, end]`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Builds the window that starts at `start` and spans one `mode` period.
    pub fn from_start(start: NaiveDateTime, mode: AnalysisMode) -> Self {
        Self {
            start,
            end: start + mode.span(),
        }
    }

    /// Whether `timestamp` falls inside the window, both bounds included.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }

    /// Start bound as milliseconds since the epoch (timestamps are zone-less and treated as UTC).
    pub fn start_ms(&self) -> i64 {
        to_millis(&self.start)
    }

    /// End bound as milliseconds since the epoch.
    pub fn end_ms(&self) -> i64 {
        to_millis(&self.end)
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            format_local_datetime(&self.start),
            format_local_datetime(&self.end)
        )
    }
}

/// The verdict for one offending IP over one analysis window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDecision {
    /// Blocked client address
    pub ip: String,
    /// Requests made within the window
    pub count: u64,
    /// Requests allowed within the window
    pub threshold: u64,
    /// Inclusive window start
    pub window_start: NaiveDateTime,
    /// Inclusive window end
    pub window_end: NaiveDateTime,
    /// Justification in the documented block-list format
    pub comment: String,
}

impl BlockDecision {
    /// Builds a decision and renders its comment.
    pub fn new(ip: impl Into<String>, count: u64, threshold: u64, window: &AnalysisWindow) -> Self {
        let ip = ip.into();
        let comment = block_comment(&ip, count, threshold, window);
        Self {
            ip,
            count,
            threshold,
            window_start: window.start,
            window_end: window.end,
            comment,
        }
    }
}

/// Renders the block-list justification.
///
/// Downstream tooling matches on this exact wording:
/// `ip[<ip>] is blocked! Because it made [<count> over <threshold>(allowed)] requests during <start> to <end>`
pub fn block_comment(ip: &str, count: u64, threshold: u64, window: &AnalysisWindow) -> String {
    format!(
        "ip[{}] is blocked! Because it made [{} over {}(allowed)] requests during {}",
        ip, count, threshold, window
    )
}

/// Formats a date-time in ISO-8601 local form using the shortest lossless rendering.
///
/// Seconds are omitted when they and the fraction are zero, and the fraction is
/// printed with 3, 6 or 9 digits as needed:
/// `2017-01-01T13:00`, `2017-01-01T13:00:05`, `2017-01-01T13:00:05.123`.
pub fn format_local_datetime(dt: &NaiveDateTime) -> String {
    let nanos = dt.nanosecond();
    if nanos == 0 {
        if dt.second() == 0 {
            dt.format("%Y-%m-%dT%H:%M").to_string()
        } else {
            dt.format("%Y-%m-%dT%H:%M:%S").to_string()
        }
    } else if nanos % 1_000_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    } else if nanos % 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.9f").to_string()
    }
}

/// Milliseconds since the epoch for a zone-less timestamp.
pub fn to_millis(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Inverse of [`to_millis`]. Returns `None` for values outside chrono's range.
pub fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}
