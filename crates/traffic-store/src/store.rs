//! Main store implementation.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use traffic_types::{DailyTraffic, TrafficDate, line};

use crate::atomic;
use crate::clock::{Clock, LocalClock};
use crate::config::StoreConfig;
use crate::error::Result;

/// Most records a single load will accept.
pub const MAX_RECORDS: usize = 10_000;

/// Day-by-day traffic history bound to a text file.
///
/// Records are kept sorted newest first with at most one record per date.
/// After every [`load`](Self::load) or [`merge`](Self::merge) the history
/// contains a record for today, and the today counters mirror it.
///
/// # Example
///
/// ```no_run
/// use traffic_store::HistoryStore;
///
/// let mut history = HistoryStore::new("history_traffic.dat");
/// history.load();
///
/// // Feed the live counters back in, then persist.
/// history.set_today_traffic(3 * 1024 * 1024, 40 * 1024 * 1024);
/// history.save()?;
/// # Ok::<(), traffic_store::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore<C = LocalClock> {
    path: PathBuf,
    clock: C,
    records: Vec<DailyTraffic>,
    today_uploaded_bytes: i64,
    today_downloaded_bytes: i64,
    record_count: usize,
    max_records: usize,
}

impl HistoryStore<LocalClock> {
    /// Create an empty store for `path` that uses the local date as "today".
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, LocalClock)
    }

    /// Create an empty store from configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolved_path()).with_max_records(config.effective_max_records())
    }
}

impl<C: Clock> HistoryStore<C> {
    /// Create an empty store for `path` with a custom clock.
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            path: path.into(),
            clock,
            records: Vec::new(),
            today_uploaded_bytes: 0,
            today_downloaded_bytes: 0,
            record_count: 0,
            max_records: MAX_RECORDS,
        }
    }

    /// Lower the number of records a load accepts. Clamped to [`MAX_RECORDS`].
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records.min(MAX_RECORDS);
        self
    }

    // === Accessors ===

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The clock used to decide which day is today.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// All records, newest first.
    pub fn records(&self) -> &[DailyTraffic] {
        &self.records
    }

    /// Bytes uploaded today, as of the last normalization or update.
    pub fn today_uploaded_bytes(&self) -> i64 {
        self.today_uploaded_bytes
    }

    /// Bytes downloaded today, as of the last normalization or update.
    pub fn today_downloaded_bytes(&self) -> i64 {
        self.today_downloaded_bytes
    }

    /// Record count as last computed, or as announced by the file header
    /// after [`load_record_count_header`](Self::load_record_count_header).
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Most records a load accepts.
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Today's record, if the history has one.
    pub fn today_record(&self) -> Option<&DailyTraffic> {
        let today = self.clock.today();
        position_of(&self.records, today)
            .ok()
            .map(|index| &self.records[index])
    }

    // === File operations ===

    /// Replace the in-memory history with the contents of the file.
    ///
    /// A missing file is an empty history. Lines that do not parse are
    /// skipped, and reading stops once [`max_records`](Self::max_records)
    /// records have been accepted. The history is normalized afterwards in
    /// every case.
    pub fn load(&mut self) {
        let records = match File::open(&self.path) {
            Ok(file) => self.read_records(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No history file at {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Cannot open history file {}: {e}", self.path.display());
                Vec::new()
            }
        };

        self.records = records;
        self.normalize();

        info!(
            "Loaded {} history records from {}",
            self.records.len(),
            self.path.display()
        );
    }

    fn read_records(&self, reader: impl BufRead) -> Vec<DailyTraffic> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, raw) in reader.split(b'\n').enumerate() {
            if records.len() >= self.max_records {
                debug!("Record cap of {} reached, ignoring the rest", self.max_records);
                break;
            }

            let raw = match raw {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Read error in {}: {e}", self.path.display());
                    break;
                }
            };
            let text = String::from_utf8_lossy(&raw);

            if index == 0 && line::is_header(&text) {
                continue;
            }

            match line::parse_line(&text) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {skipped} unusable lines in {}", self.path.display());
        }
        records
    }

    /// Read only the header line and take the count it announces.
    ///
    /// Records and today counters are not touched. Returns the new count, or
    /// `None` (leaving the count unchanged) when the file or header is missing
    /// or malformed.
    pub fn load_record_count_header(&mut self) -> Option<usize> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                debug!("No header to read from {}: {e}", self.path.display());
                return None;
            }
        };

        let mut first = Vec::new();
        if let Err(e) = BufReader::new(file).read_until(b'\n', &mut first) {
            warn!("Cannot read header of {}: {e}", self.path.display());
            return None;
        }

        let count = line::parse_header(&String::from_utf8_lossy(&first))?;
        self.record_count = count;
        Some(count)
    }

    /// Write the whole history to the file atomically.
    ///
    /// The in-memory state is not modified. On failure the previous file is
    /// left as it was and the error is returned.
    pub fn save(&self) -> Result<()> {
        atomic::write_atomic(&self.path, |w| {
            writeln!(w, "{}", line::format_header(self.records.len()))?;
            for record in &self.records {
                writeln!(w, "{record}")?;
            }
            Ok(())
        })
        .inspect_err(|e| warn!("History not saved: {e}"))?;

        info!(
            "Saved {} history records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    // === In-memory operations ===

    /// Combine another history into this one.
    ///
    /// With `ignore_same_date`, records whose date already exists here are
    /// dropped and the existing record wins untouched. Without it every
    /// record is appended, and normalization then sums the traffic of
    /// records sharing a date.
    pub fn merge<D: Clock>(&mut self, other: &HistoryStore<D>, ignore_same_date: bool) {
        // Only the part present before merging is known to be sorted.
        let existing = self.records.len();
        let mut ignored = 0usize;

        for record in other.records() {
            if ignore_same_date
                && position_of(&self.records[..existing], record.date).is_ok()
            {
                ignored += 1;
                continue;
            }
            self.records.push(*record);
        }

        debug!(
            "Merged {} records from {} ({ignored} same-date records ignored)",
            other.records().len() - ignored,
            other.path().display()
        );

        self.normalize();
    }

    /// Sort, combine same-date records and make sure today has a record.
    ///
    /// Runs automatically after load and merge. Call it again after midnight
    /// to start a record for the new day. Running it twice in a row changes
    /// nothing.
    pub fn normalize(&mut self) {
        let today = self.clock.today();

        if self.records.is_empty() {
            self.records.push(DailyTraffic::empty(today));
        }

        if self.records.len() >= 2 {
            self.records.sort_by(|a, b| b.date.cmp(&a.date));
            self.records = combine_same_dates(mem::take(&mut self.records));
        }

        match position_of(&self.records, today) {
            Ok(index) => {
                let record = &mut self.records[index];
                self.today_uploaded_bytes = record.uploaded_bytes();
                self.today_downloaded_bytes = record.downloaded_bytes();
                record.download_only = false;
            }
            // Normally index 0; later only when the file holds future dates.
            Err(index) => self.records.insert(index, DailyTraffic::empty(today)),
        }

        self.record_count = self.records.len();
    }

    /// Set today's traffic from live byte counters.
    ///
    /// Stores the traffic, rounded down to whole KiB, in today's record and
    /// sets the today counters from that record so both always agree. A
    /// record for today is created first if the day has changed since the
    /// last normalization.
    pub fn set_today_traffic(&mut self, uploaded_bytes: i64, downloaded_bytes: i64) {
        let today = self.clock.today();
        let index = match position_of(&self.records, today) {
            Ok(index) => index,
            Err(_) => {
                self.normalize();
                match position_of(&self.records, today) {
                    Ok(index) => index,
                    Err(_) => return,
                }
            }
        };

        let record = &mut self.records[index];
        record.uploaded_kib = bytes_to_kib(uploaded_bytes);
        record.downloaded_kib = bytes_to_kib(downloaded_bytes);
        record.download_only = false;

        self.today_uploaded_bytes = record.uploaded_bytes();
        self.today_downloaded_bytes = record.downloaded_bytes();
    }
}

/// Binary search a newest-first slice for `date`.
fn position_of(records: &[DailyTraffic], date: TrafficDate) -> std::result::Result<usize, usize> {
    records.binary_search_by(|probe| date.cmp(&probe.date))
}

/// Fold runs of equal dates in a sorted list into single records.
fn combine_same_dates(sorted: Vec<DailyTraffic>) -> Vec<DailyTraffic> {
    let mut combined: Vec<DailyTraffic> = Vec::with_capacity(sorted.len());
    for record in sorted {
        match combined.last_mut() {
            Some(last) if last.date == record.date => last.absorb(&record),
            _ => combined.push(record),
        }
    }
    combined
}

fn bytes_to_kib(bytes: i64) -> u64 {
    u64::try_from(bytes).unwrap_or(0) / traffic_types::BYTES_PER_KIB
}
