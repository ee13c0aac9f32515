//! Access-log line parsing.
//!
//! One line has five `|`-separated fields:
//!
//! ```text
//! 2017-01-01 00:00:11.763|192.168.234.82|"GET / HTTP/1.1"|200|"swcd (unknown version) CFNetwork/808.2.16 Darwin/15.6.0"
//! ```
//!
//! Only the timestamp is validated. The request, response code and client info
//! are stored exactly as they appear, quotes included.

use chrono::NaiveDateTime;

use crate::config::{LOG_FIELD_DELIMITER, LOG_TIMESTAMP_FORMAT};
use crate::error_handling::ParseError;
use crate::models::LogRecord;

/// Parses one raw access-log line.
///
/// Empty tokens are dropped before counting, so adjacent delimiters do not
/// produce empty fields. Any line that does not yield exactly five fields, or
/// whose first field is not a `yyyy-MM-dd HH:mm:ss.SSS` timestamp, is rejected
/// as a whole.
pub fn parse_line(line: &str) -> Result<LogRecord, ParseError> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line
        .split(LOG_FIELD_DELIMITER)
        .filter(|field| !field.is_empty())
        .collect();

    let [timestamp, ip, request, response_code, client_info] = fields[..] else {
        return Err(ParseError::FieldCount {
            found: fields.len(),
        });
    };

    let timestamp = parse_timestamp(timestamp)?;

    Ok(LogRecord {
        timestamp,
        ip: ip.to_string(),
        request: request.to_string(),
        response_code: response_code.to_string(),
        client_info: client_info.to_string(),
    })
}

/// Parses the timestamp field. `%3f` takes exactly three fractional digits.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value, LOG_TIMESTAMP_FORMAT).map_err(|source| {
        ParseError::Timestamp {
            value: value.to_string(),
            source,
        }
    })
}
