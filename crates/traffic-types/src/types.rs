//! Core types for daily traffic records.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of bytes in one kibibyte, the unit traffic is stored in.
pub const BYTES_PER_KIB: u64 = 1024;

/// A calendar day identified by its (year, month, day) triple.
///
/// Ordering and equality compare the triple only. No calendar validation is
/// performed: `2023/02/31` is a perfectly good `TrafficDate` and sorts between
/// `2023/02/30` and `2023/03/01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrafficDate {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
}

impl TrafficDate {
    /// Smallest year accepted when loading history.
    pub const MIN_YEAR: u16 = 1900;
    /// Largest year accepted when loading history.
    pub const MAX_YEAR: u16 = 3000;

    /// Create a date from its parts without validation.
    #[must_use]
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Whether every field lies in the range the history loader accepts.
    ///
    /// Day is checked against 1-31 regardless of month or leap year.
    ///
    /// ```
    /// use traffic_types::TrafficDate;
    ///
    /// assert!(TrafficDate::new(2024, 2, 31).is_in_range());
    /// assert!(!TrafficDate::new(1899, 12, 31).is_in_range());
    /// assert!(!TrafficDate::new(2024, 13, 1).is_in_range());
    /// ```
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (Self::MIN_YEAR..=Self::MAX_YEAR).contains(&self.year)
            && (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
    }
}

impl From<time::Date> for TrafficDate {
    fn from(date: time::Date) -> Self {
        // Years outside u16 never survive the range check anyway.
        let year = u16::try_from(date.year()).unwrap_or(0);
        Self {
            year,
            month: u8::from(date.month()),
            day: date.day(),
        }
    }
}

impl fmt::Display for TrafficDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// Traffic accumulated over one calendar day.
///
/// `download_only` marks records that came from the legacy single-value line
/// format, which has no upload figure. Such records are written back in the
/// same single-value form so that older readers keep understanding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DailyTraffic {
    /// The day this record covers.
    pub date: TrafficDate,
    /// Uploaded traffic in KiB.
    pub uploaded_kib: u64,
    /// Downloaded traffic in KiB.
    pub downloaded_kib: u64,
    /// True for legacy records without a separate upload figure.
    pub download_only: bool,
}

impl DailyTraffic {
    /// A record with separate upload and download figures.
    #[must_use]
    pub const fn new(date: TrafficDate, uploaded_kib: u64, downloaded_kib: u64) -> Self {
        Self {
            date,
            uploaded_kib,
            downloaded_kib,
            download_only: false,
        }
    }

    /// A legacy record carrying a single combined figure.
    #[must_use]
    pub const fn download_only(date: TrafficDate, downloaded_kib: u64) -> Self {
        Self {
            date,
            uploaded_kib: 0,
            downloaded_kib,
            download_only: true,
        }
    }

    /// A zero-traffic record for `date`.
    #[must_use]
    pub const fn empty(date: TrafficDate) -> Self {
        Self::new(date, 0, 0)
    }

    /// Upload plus download, in KiB.
    #[must_use]
    pub fn total_kib(&self) -> u64 {
        self.uploaded_kib.saturating_add(self.downloaded_kib)
    }

    /// Upload plus download, in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_kib().saturating_mul(BYTES_PER_KIB)
    }

    /// Whether the record carries no traffic.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_kib() == 0
    }

    /// Uploaded traffic as a signed byte count.
    #[must_use]
    pub fn uploaded_bytes(&self) -> i64 {
        kib_to_signed_bytes(self.uploaded_kib)
    }

    /// Downloaded traffic as a signed byte count.
    #[must_use]
    pub fn downloaded_bytes(&self) -> i64 {
        kib_to_signed_bytes(self.downloaded_kib)
    }

    /// Add another record's traffic into this one.
    ///
    /// The date of `self` is kept. The result stays `download_only` only
    /// while it has no upload figure, since the single-value line form has
    /// nowhere to put one.
    pub fn absorb(&mut self, other: &DailyTraffic) {
        self.uploaded_kib = self.uploaded_kib.saturating_add(other.uploaded_kib);
        self.downloaded_kib = self.downloaded_kib.saturating_add(other.downloaded_kib);
        self.download_only &= self.uploaded_kib == 0;
    }
}

fn kib_to_signed_bytes(kib: u64) -> i64 {
    i64::try_from(kib.saturating_mul(BYTES_PER_KIB)).unwrap_or(i64::MAX)
}
