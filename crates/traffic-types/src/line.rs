//! The on-disk line format.
//!
//! A history file is plain text, one record per line:
//!
//! ```text
//! lines: "3"
//! 2024/01/16 120/4096
//! 2024/01/15 500
//! 2024/01/14 80/1024
//! ```
//!
//! The first line is a header carrying the record count. Each data line holds
//! a zero-padded `YYYY/MM/DD` date followed by either `up/down` or a single
//! legacy `down` figure, all in KiB.
//!
//! Parsing is deliberately forgiving: numeric fields are read the way C's
//! `atoi` reads them (leading digits, anything unparsable is zero), and lines
//! that do not describe a usable record are simply rejected.

use core::fmt;
use core::str::FromStr;

use crate::error::{ParseError, ParseResult};
use crate::types::{DailyTraffic, TrafficDate};

/// Text that introduces the header line.
pub const HEADER_PREFIX: &str = "lines:";

/// Shortest line that can hold a record (`YYYY/MM/DD` plus a separator and one digit).
pub const MIN_LINE_LEN: usize = 12;

/// Byte offset at which the traffic figures start.
const TRAFFIC_OFFSET: usize = 11;

/// Parse one data line, returning `None` for anything that is not a usable record.
///
/// # Examples
///
/// ```
/// use traffic_types::{line, DailyTraffic, TrafficDate};
///
/// let record = line::parse_line("2024/01/15 500").unwrap();
/// assert_eq!(record, DailyTraffic::download_only(TrafficDate::new(2024, 1, 15), 500));
///
/// assert!(line::parse_line("2024/01/15 0/0").is_none());
/// assert!(line::parse_line("garbage").is_none());
/// ```
#[must_use]
pub fn parse_line(line: &str) -> Option<DailyTraffic> {
    try_parse_line(line).ok()
}

/// Parse one data line, reporting why it was rejected.
pub fn try_parse_line(line: &str) -> ParseResult<DailyTraffic> {
    if line.len() < MIN_LINE_LEN {
        return Err(ParseError::TooShort {
            len: line.len(),
            min: MIN_LINE_LEN,
        });
    }

    let year = date_field(line, 0..4);
    if year < i64::from(TrafficDate::MIN_YEAR) || year > i64::from(TrafficDate::MAX_YEAR) {
        return Err(ParseError::DateOutOfRange {
            field: "year",
            value: year,
        });
    }
    let month = date_field(line, 5..7);
    if !(1..=12).contains(&month) {
        return Err(ParseError::DateOutOfRange {
            field: "month",
            value: month,
        });
    }
    let day = date_field(line, 8..10);
    if !(1..=31).contains(&day) {
        return Err(ParseError::DateOutOfRange {
            field: "day",
            value: day,
        });
    }

    // The ranges above make these conversions lossless.
    let date = TrafficDate::new(year as u16, month as u8, day as u8);

    let rest = line.get(TRAFFIC_OFFSET..).ok_or_else(|| {
        ParseError::InvalidData(format!("no traffic field at offset {TRAFFIC_OFFSET}"))
    })?;

    let record = match rest.split_once('/') {
        Some((up, down)) => DailyTraffic::new(date, kib_field(up), kib_field(down)),
        None => DailyTraffic::download_only(date, kib_field(rest)),
    };

    if record.is_empty() {
        return Err(ParseError::ZeroTraffic);
    }
    Ok(record)
}

/// Parse a `lines: "<digits>"` header, returning the count it announces.
///
/// ```
/// use traffic_types::line;
///
/// assert_eq!(line::parse_header("lines: \"42\""), Some(42));
/// assert_eq!(line::parse_header("lines: \"4x2\""), None);
/// assert_eq!(line::parse_header("2024/01/15 500"), None);
/// ```
#[must_use]
pub fn parse_header(line: &str) -> Option<usize> {
    let after_prefix = &line[line.find(HEADER_PREFIX)? + HEADER_PREFIX.len()..];
    let (_, quoted) = after_prefix.split_once('"')?;
    let (digits, _) = quoted.split_once('"')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether a line is a count header rather than a data line.
#[must_use]
pub fn is_header(line: &str) -> bool {
    line.trim_start().starts_with(HEADER_PREFIX)
}

/// Render the header line for `count` records, without a trailing newline.
#[must_use]
pub fn format_header(count: usize) -> String {
    format!("{HEADER_PREFIX} \"{count}\"")
}

/// Render a record in its on-disk form, without a trailing newline.
#[must_use]
pub fn format_record(record: &DailyTraffic) -> String {
    record.to_string()
}

impl fmt::Display for DailyTraffic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.download_only {
            write!(f, "{} {}", self.date, self.downloaded_kib)
        } else {
            write!(
                f,
                "{} {}/{}",
                self.date, self.uploaded_kib, self.downloaded_kib
            )
        }
    }
}

impl FromStr for DailyTraffic {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        try_parse_line(s)
    }
}

/// Read a date field; slices that fall off the line or off a char boundary read as zero.
fn date_field(line: &str, range: core::ops::Range<usize>) -> i64 {
    let (negative, magnitude) = leading_integer(line.get(range).unwrap_or(""));
    let value = i64::try_from(magnitude).unwrap_or(i64::MAX);
    if negative { -value } else { value }
}

/// Read a KiB figure; negative values count as zero.
fn kib_field(field: &str) -> u64 {
    match leading_integer(field) {
        (true, _) => 0,
        (false, magnitude) => magnitude,
    }
}

/// `atoi`-style scan: optional whitespace, optional sign, then as many digits as follow.
fn leading_integer(field: &str) -> (bool, u64) {
    let trimmed = field.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        });

    (negative, magnitude)
}


/// Property-based tests for the line parser.
///
/// Run with:
/// ```bash
/// cargo test -p traffic-types line::proptests
/// ```
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Parsing arbitrary text should never panic.
        #[test]
        fn parse_line_never_panics(line in ".*") {
            let _ = parse_line(&line);
            let _ = parse_header(&line);
        }

        /// Any in-range record with traffic survives a format/parse cycle.
        #[test]
        fn formatted_records_parse_back(
            year in 1900u16..=3000,
            month in 1u8..=12,
            day in 1u8..=31,
            up in 0u64..1_000_000_000,
            down in 1u64..1_000_000_000,
            download_only: bool,
        ) {
            let date = TrafficDate::new(year, month, day);
            let record = if download_only {
                DailyTraffic::download_only(date, down)
            } else {
                DailyTraffic::new(date, up, down)
            };
            prop_assert_eq!(parse_line(&format_record(&record)), Some(record));
        }
    }
}
