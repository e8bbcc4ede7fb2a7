//! File exports of a dashboard snapshot.

use std::sync::Arc;

use chrono::NaiveDate;
use polars::prelude::*;
use tickerboard_core::data::InMemoryProvider;
use tickerboard_core::domain::{DateRange, Symbol};
use tickerboard_runner::export::summary_markdown;
use tickerboard_runner::{save_export, Dashboard, DashboardSnapshot, ExportFormat, DEFAULT_TTL};

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
}

fn snapshot() -> DashboardSnapshot {
    let provider = InMemoryProvider::new()
        .with_series(sym("AAPL"), [(d(2), Some(100.0), Some(1_500.0)), (d(3), Some(121.0), None)])
        .with_series(sym("MSFT"), [(d(3), Some(400.0), Some(10.0))]);
    let dashboard = Dashboard::new(Arc::new(provider), DEFAULT_TTL);
    dashboard
        .snapshot(&[sym("AAPL"), sym("MSFT"), sym("NOPE")], DateRange::new(d(1), d(30)).unwrap())
        .unwrap()
}

#[test]
fn long_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    save_export(&snapshot(), ExportFormat::Csv, &path, false).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("date,symbol,close,volume"));
    // two dates × two symbols
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("2024-09-02,MSFT,,"));
}

#[test]
fn summary_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.json");
    save_export(&snapshot(), ExportFormat::Json, &path, true).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["symbol"], "AAPL");
    assert_eq!(rows[0]["change_pct"], 21.0);
    assert!(rows[1]["change_pct"].is_null());
}

#[test]
fn snapshot_json_reports_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    save_export(&snapshot(), ExportFormat::Json, &path, false).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["unresolved"][0], "NOPE");
    assert_eq!(value["rows"].as_array().unwrap().len(), 4);
    assert!(value.get("table").is_none());
}

#[test]
fn long_parquet_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.parquet");
    save_export(&snapshot(), ExportFormat::Parquet, &path, false).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();
    assert_eq!(df.shape(), (4, 4));
    assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("close").unwrap().null_count(), 1);
}

#[test]
fn markdown_summary() {
    let md = summary_markdown(&snapshot());
    assert!(md.contains("| AAPL | 121.00 | +21.00% | n/a | 2024-09-03 |"));
    assert!(md.contains("No data: NOPE"));
}
