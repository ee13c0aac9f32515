// Parse module tests.

use super::*;
use chrono::{NaiveDate, Timelike};

const SAMPLE: &str = "2017-01-01 00:00:11.763|192.168.234.82|\"GET / HTTP/1.1\"|200|\"swcd (unknown version) CFNetwork/808.2.16 Darwin/15.6.0\"";

#[test]
fn test_parse_line_basic() {
    let record = parse_line(SAMPLE).unwrap();
    assert_eq!(
        record.timestamp,
        NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 11, 763)
            .unwrap()
    );
    assert_eq!(record.ip, "192.168.234.82");
    assert_eq!(record.request, "\"GET / HTTP/1.1\"");
    assert_eq!(record.response_code, "200");
    assert_eq!(
        record.client_info,
        "\"swcd (unknown version) CFNetwork/808.2.16 Darwin/15.6.0\""
    );
}

#[test]
fn test_parse_line_keeps_fields_verbatim() {
    // Non-numeric codes and IPv6 addresses are stored untouched
    let line = "2017-01-01 23:59:59.999|2001:db8::1|GET /health|abc|curl/7.0";
    let record = parse_line(line).unwrap();
    assert_eq!(record.ip, "2001:db8::1");
    assert_eq!(record.request, "GET /health");
    assert_eq!(record.response_code, "abc");
    assert_eq!(record.client_info, "curl/7.0");
    assert_eq!(record.timestamp.nanosecond(), 999_000_000);
}

#[test]
fn test_parse_line_strips_carriage_return() {
    let line = format!("{SAMPLE}\r");
    let record = parse_line(&line).unwrap();
    assert!(!record.client_info.ends_with('\r'));
}

#[test]
fn test_parse_line_too_few_fields() {
    let err = parse_line("2017-01-01 00:00:11.763|192.168.234.82|\"GET / HTTP/1.1\"|200").unwrap_err();
    assert!(matches!(err, ParseError::FieldCount { found: 4 }));
}

#[test]
fn test_parse_line_too_many_fields() {
    let err = parse_line(&format!("{SAMPLE}|extra")).unwrap_err();
    assert!(matches!(err, ParseError::FieldCount { found: 6 }));
}

#[test]
fn test_parse_line_empty_field_is_dropped() {
    // Adjacent delimiters collapse, leaving four fields
    let err = parse_line("2017-01-01 00:00:11.763|192.168.234.82||200|\"swcd\"").unwrap_err();
    assert!(matches!(err, ParseError::FieldCount { found: 4 }));
}

#[test]
fn test_parse_line_empty() {
    assert!(matches!(
        parse_line(""),
        Err(ParseError::FieldCount { found: 0 })
    ));
}

#[test]
fn test_parse_line_bad_timestamp() {
    let err = parse_line("2017/01/01 00:00:11.763|1.2.3.4|\"GET /\"|200|\"ua\"").unwrap_err();
    match err {
        ParseError::Timestamp { value, .. } => assert_eq!(value, "2017/01/01 00:00:11.763"),
        other => panic!("expected timestamp error, got {other:?}"),
    }
}

#[test]
fn test_parse_line_requires_millisecond_precision() {
    for ts in [
        "2017-01-01 00:00:11",
        "2017-01-01 00:00:11.7",
        "2017-01-01 00:00:11.7631",
    ] {
        let line = format!("{ts}|1.2.3.4|\"GET /\"|200|\"ua\"");
        assert!(
            matches!(parse_line(&line), Err(ParseError::Timestamp { .. })),
            "{ts} should be rejected"
        );
    }
}

#[test]
fn test_parse_line_rejects_impossible_date() {
    let line = "2017-02-30 00:00:11.763|1.2.3.4|\"GET /\"|200|\"ua\"";
    assert!(matches!(
        parse_line(line),
        Err(ParseError::Timestamp { .. })
    ));
}

// Property-based tests using proptest
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_parse_line_accepts_any_well_formed_line(
        h in 0u32..24,
        m in 0u32..60,
        s in 0u32..60,
        ms in 0u32..1000,
        ip in "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        request in "\"[A-Z]{3,6} /[a-z/]{0,20} HTTP/1\\.1\"",
        code in "[0-9]{3}",
        agent in "\"[A-Za-z0-9 ./()]{1,40}\"",
    ) {
        let line = format!("2017-01-01 {h:02}:{m:02}:{s:02}.{ms:03}|{ip}|{request}|{code}|{agent}");
        let record = parse_line(&line).unwrap();
        prop_assert_eq!(record.timestamp.hour(), h);
        prop_assert_eq!(record.timestamp.nanosecond(), ms * 1_000_000);
        prop_assert_eq!(record.ip, ip);
        prop_assert_eq!(record.request, request);
        prop_assert_eq!(record.response_code, code);
        prop_assert_eq!(record.client_info, agent);
    }

    #[test]
    fn test_parse_line_never_panics(line in "\\PC{0,120}") {
        let _ = parse_line(&line);
    }
}
