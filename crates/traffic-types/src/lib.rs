//! Value types for a day-by-day network traffic history.
//!
//! This crate holds the pieces of the traffic history that do not touch the
//! filesystem: the calendar-day key, the per-day record, and the text line
//! format records are stored in. Persistence lives in `traffic-store`.
//!
//! # Example
//!
//! ```
//! use traffic_types::{DailyTraffic, TrafficDate, line};
//!
//! let record = DailyTraffic::new(TrafficDate::new(2024, 1, 16), 120, 4096);
//! assert_eq!(line::format_record(&record), "2024/01/16 120/4096");
//! assert_eq!(line::parse_line("2024/01/16 120/4096"), Some(record));
//! ```

pub mod error;
pub mod line;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{BYTES_PER_KIB, DailyTraffic, TrafficDate};
