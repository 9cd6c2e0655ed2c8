//! Durable flat-file persistence for a daily network traffic history.
//!
//! A [`HistoryStore`] keeps one record per calendar day, newest first, and
//! reads and writes them as a small text file. Loading is forgiving (bad
//! lines are dropped), saving is atomic (the file is replaced in one step or
//! not at all), and every load or merge leaves a record for today whose
//! traffic is mirrored in the today counters.
//!
//! # Features
//!
//! - Legacy single-value lines are understood and written back unchanged
//! - Same-date records are combined on load and merge
//! - Merging can either sum colliding days or keep the existing ones
//! - Cheap header-only reads of the record count
//! - Injectable [`Clock`] so "today" can be fixed in tests
//!
//! # Example
//!
//! ```no_run
//! use traffic_store::{HistoryStore, StoreConfig};
//!
//! let config = StoreConfig::load("traffic.toml")?;
//! let mut history = HistoryStore::from_config(&config);
//! history.load();
//!
//! for day in history.records().iter().take(7) {
//!     println!("{}: {} KiB", day.date, day.total_kib());
//! }
//! # Ok::<(), traffic_store::Error>(())
//! ```

pub mod atomic;
mod clock;
mod config;
mod error;
mod store;

pub use clock::{Clock, FixedClock, LocalClock};
pub use config::{StoreConfig, default_history_path};
pub use error::{Error, Result};
pub use store::{HistoryStore, MAX_RECORDS};
pub use traffic_types::{DailyTraffic, TrafficDate};
