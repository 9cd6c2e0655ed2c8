//! End-to-end tests for the history file: save, reload, merge and failure handling.

use std::fs;
use std::path::Path;

use traffic_store::{DailyTraffic, FixedClock, HistoryStore, MAX_RECORDS, TrafficDate, atomic};

const TODAY: TrafficDate = TrafficDate::new(2024, 6, 20);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn date(year: u16, month: u8, day: u8) -> TrafficDate {
    TrafficDate::new(year, month, day)
}

fn open(path: &Path) -> HistoryStore<FixedClock> {
    let mut store = HistoryStore::with_clock(path, FixedClock(TODAY));
    store.load();
    store
}

fn without_today(store: &HistoryStore<FixedClock>) -> Vec<(TrafficDate, u64, u64)> {
    store
        .records()
        .iter()
        .filter(|r| r.date != TODAY)
        .map(|r| (r.date, r.uploaded_kib, r.downloaded_kib))
        .collect()
}

#[test]
fn test_save_then_load_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");
    fs::write(
        &path,
        "2024/06/19 100/2000\n2024/06/01 5/6\n2023/12/31 1/0\n2020/02/30 0/9\n",
    )
    .unwrap();

    let first = open(&path);
    first.save().unwrap();
    let second = open(&path);

    assert_eq!(without_today(&first), without_today(&second));
    assert_eq!(
        without_today(&second),
        vec![
            (date(2024, 6, 19), 100, 2000),
            (date(2024, 6, 1), 5, 6),
            (date(2023, 12, 31), 1, 0),
            (date(2020, 2, 30), 0, 9),
        ]
    );
}

#[test]
fn test_download_only_line_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");
    fs::write(&path, "lines: \"1\"\n2024/01/15 500\n").unwrap();

    let store = open(&path);
    assert_eq!(
        store.records()[1],
        DailyTraffic::download_only(date(2024, 1, 15), 500)
    );

    store.save().unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.lines().any(|l| l == "2024/01/15 500"));
    assert!(!text.contains("0/500"));
}

#[test]
fn test_today_traffic_survives_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");

    let mut store = open(&path);
    store.set_today_traffic(10 * 1024, 300 * 1024);
    store.save().unwrap();

    let reopened = open(&path);
    assert_eq!(reopened.today_uploaded_bytes(), 10 * 1024);
    assert_eq!(reopened.today_downloaded_bytes(), 300 * 1024);
    assert_eq!(reopened.records()[0], DailyTraffic::new(TODAY, 10, 300));
}

#[test]
fn test_load_caps_record_count() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");

    // 10050 distinct valid dates, all before today.
    let mut body = String::from("lines: \"10050\"\n");
    let mut written = 0;
    'outer: for year in 1950u16..2000 {
        for month in 1u8..=12 {
            for day in 1u8..=28 {
                body.push_str(&format!("{year:04}/{month:02}/{day:02} 1/1\n"));
                written += 1;
                if written == 10_050 {
                    break 'outer;
                }
            }
        }
    }
    fs::write(&path, body).unwrap();

    let store = open(&path);
    assert_eq!(store.records().len(), MAX_RECORDS + 1);
    assert_eq!(store.records()[0].date, TODAY);
    assert_eq!(store.record_count(), MAX_RECORDS + 1);
}

#[test]
fn test_merge_policy_asymmetry() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let a_path = dir.path().join("a.dat");
    let b_path = dir.path().join("b.dat");
    fs::write(&a_path, "2024/01/01 10/20\n").unwrap();
    fs::write(&b_path, "2024/01/01 5/5\n").unwrap();

    let b = open(&b_path);

    let mut keep = open(&a_path);
    keep.merge(&b, true);
    assert_eq!(without_today(&keep), vec![(date(2024, 1, 1), 10, 20)]);

    let mut sum = open(&a_path);
    sum.merge(&b, false);
    assert_eq!(without_today(&sum), vec![(date(2024, 1, 1), 15, 25)]);
}

#[test]
fn test_failed_save_leaves_file_bytes_unchanged() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");
    let original = b"lines: \"2\"\n2024/06/19 1/2\n2024/06/18 3\n".to_vec();
    fs::write(&path, &original).unwrap();
    fs::create_dir(atomic::temp_path_for(&path)).unwrap();

    let mut store = open(&path);
    store.set_today_traffic(1 << 20, 1 << 20);

    assert!(store.save().is_err());
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn test_header_read_is_independent_of_records() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history_traffic.dat");
    fs::write(&path, "lines: \"2\"\n2024/06/20 7/7\n2024/06/18 3\n").unwrap();

    let mut store = open(&path);
    let records = store.records().to_vec();
    let (up, down) = (store.today_uploaded_bytes(), store.today_downloaded_bytes());

    fs::write(&path, "lines: \"9999\"\n").unwrap();
    assert_eq!(store.load_record_count_header(), Some(9999));

    assert_eq!(store.record_count(), 9999);
    assert_eq!(store.records(), records.as_slice());
    assert_eq!(store.today_uploaded_bytes(), up);
    assert_eq!(store.today_downloaded_bytes(), down);
}

#[test]
fn test_save_creates_missing_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("netmon").join("history_traffic.dat");

    let store = open(&path);
    store.save().unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "lines: \"1\"\n2024/06/20 0/0\n"
    );
    assert!(!atomic::temp_path_for(&path).exists());
}
