//! Source of "today" for history normalization.

use time::OffsetDateTime;
use tracing::warn;

use traffic_types::TrafficDate;

/// Supplies the current calendar date.
///
/// The store asks its clock for today's date every time it normalizes, so a
/// fixed clock makes load and merge fully deterministic.
pub trait Clock {
    /// The current calendar date.
    fn today(&self) -> TrafficDate;
}

/// The system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> TrafficDate {
        let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
            warn!("Local UTC offset unavailable ({e}), using UTC date");
            OffsetDateTime::now_utc()
        });
        now.date().into()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub TrafficDate);

impl FixedClock {
    /// Move the clock to another date.
    pub fn set(&mut self, date: TrafficDate) {
        self.0 = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> TrafficDate {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> TrafficDate {
        (**self).today()
    }
}
