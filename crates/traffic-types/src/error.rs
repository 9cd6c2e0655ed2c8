//! Error types for traffic record parsing.

use thiserror::Error;

/// Errors that can occur when parsing a traffic history line.
///
/// The history loader itself never surfaces these; it drops lines it cannot
/// use. They exist for callers that parse a single line and want to know why
/// it was rejected.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The line is shorter than the minimum record length.
    #[error("Line too short: {len} characters, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// A date field is outside its accepted range.
    #[error("Invalid {field}: {value}")]
    DateOutOfRange { field: &'static str, value: i64 },

    /// The record carries no traffic at all.
    #[error("Record has zero traffic")]
    ZeroTraffic,

    /// Catch-all for malformed input.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using traffic-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
