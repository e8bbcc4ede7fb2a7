//! Export of dashboard results: CSV, JSON, Parquet and a Markdown summary.
//!
//! Values are written raw (no thousands separators); absent values are
//! empty CSV cells, JSON `null`s and Parquet nulls.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tickerboard_core::data::DataError;
use tickerboard_core::format;
use tickerboard_core::frame::{long_rows_to_dataframe, summary_to_dataframe, write_parquet};
use tickerboard_core::{LongRow, SummaryRow};

use crate::dashboard::DashboardSnapshot;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Parquet(#[from] DataError),
    #[error("unknown export format '{0}' (expected csv, json, parquet or md)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
    Markdown,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(data).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: date, symbol, close, volume.
pub fn export_long_csv(rows: &[LongRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "symbol", "close", "volume"])?;
    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            r.symbol.to_string(),
            cell(r.close),
            cell(r.volume),
        ])?;
    }
    finish_csv(wtr)
}

/// Columns: symbol, last_close, change_pct, last_volume, last_date.
pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "last_close", "change_pct", "last_volume", "last_date"])?;
    for r in rows {
        wtr.write_record([
            r.symbol.to_string(),
            cell(r.last_close),
            cell(r.change_pct),
            cell(r.last_volume),
            r.last_date.to_string(),
        ])?;
    }
    finish_csv(wtr)
}

// ─── JSON export ────────────────────────────────────────────────────

/// Pretty JSON of the request, long rows, summary and unresolved symbols.
pub fn export_snapshot_json(snapshot: &DashboardSnapshot) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn export_summary_json(rows: &[SummaryRow]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

// ─── Parquet export ─────────────────────────────────────────────────

pub fn write_long_parquet(rows: &[LongRow], path: &Path) -> Result<(), ExportError> {
    let mut df = long_rows_to_dataframe(rows)?;
    write_parquet(&mut df, path)?;
    Ok(())
}

pub fn write_summary_parquet(rows: &[SummaryRow], path: &Path) -> Result<(), ExportError> {
    let mut df = summary_to_dataframe(rows)?;
    write_parquet(&mut df, path)?;
    Ok(())
}

// ─── Markdown report ────────────────────────────────────────────────

/// Human-readable summary table with display formatting applied.
pub fn summary_markdown(snapshot: &DashboardSnapshot) -> String {
    let mut md = String::with_capacity(512);
    md.push_str("# Market Summary\n\n");
    md.push_str(&format!("Period: {}\n\n", snapshot.key.range));
    md.push_str("| Symbol | Last Close | Change | Volume | As of |\n");
    md.push_str("| --- | ---: | ---: | ---: | --- |\n");
    for r in &snapshot.summary {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            r.symbol,
            format::price(r.last_close),
            format::percent(r.change_pct),
            format::volume(r.last_volume),
            r.last_date
        ));
    }
    if !snapshot.unresolved.is_empty() {
        let names: Vec<&str> = snapshot.unresolved.iter().map(|s| s.as_str()).collect();
        md.push_str(&format!("\nNo data: {}\n", names.join(", ")));
    }
    md
}

/// Write `snapshot` to `path`. With `summary_only` only the per-symbol
/// summary is written, otherwise the long rows (Markdown is always a
/// summary).
pub fn save_export(
    snapshot: &DashboardSnapshot,
    format: ExportFormat,
    path: &Path,
    summary_only: bool,
) -> Result<(), ExportError> {
    match (format, summary_only) {
        (ExportFormat::Csv, false) => std::fs::write(path, export_long_csv(&snapshot.rows)?)?,
        (ExportFormat::Csv, true) => std::fs::write(path, export_summary_csv(&snapshot.summary)?)?,
        (ExportFormat::Json, false) => std::fs::write(path, export_snapshot_json(snapshot)?)?,
        (ExportFormat::Json, true) => std::fs::write(path, export_summary_json(&snapshot.summary)?)?,
        (ExportFormat::Parquet, false) => write_long_parquet(&snapshot.rows, path)?,
        (ExportFormat::Parquet, true) => write_summary_parquet(&snapshot.summary, path)?,
        (ExportFormat::Markdown, _) => std::fs::write(path, summary_markdown(snapshot))?,
    }
    Ok(())
}
