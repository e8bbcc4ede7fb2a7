//! Polars conversions for long and summary rows.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::data::DataError;
use crate::reshape::LongRow;
use crate::summary::SummaryRow;

/// `num_days_from_ce` of 1970-01-01, the Arrow date epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> Result<Column, DataError> {
    let days: Vec<i32> = dates.map(epoch_days).collect();
    Column::new(name.into(), days)
        .cast(&DataType::Date)
        .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))
}

/// Columns: `date` (Date), `symbol`, `close`, `volume`.
pub fn long_rows_to_dataframe(rows: &[LongRow]) -> Result<DataFrame, DataError> {
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    let closes: Vec<Option<f64>> = rows.iter().map(|r| r.close).collect();
    let volumes: Vec<Option<u64>> = rows.iter().map(|r| r.volume).collect();

    DataFrame::new(vec![
        date_column("date", rows.iter().map(|r| r.date))?,
        Column::new("symbol".into(), symbols),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Columns: `symbol`, `last_close`, `change_pct`, `last_volume`, `last_date` (Date).
pub fn summary_to_dataframe(rows: &[SummaryRow]) -> Result<DataFrame, DataError> {
    let symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    let last_close: Vec<Option<f64>> = rows.iter().map(|r| r.last_close).collect();
    let change_pct: Vec<Option<f64>> = rows.iter().map(|r| r.change_pct).collect();
    let last_volume: Vec<Option<u64>> = rows.iter().map(|r| r.last_volume).collect();

    DataFrame::new(vec![
        Column::new("symbol".into(), symbols),
        Column::new("last_close".into(), last_close),
        Column::new("change_pct".into(), change_pct),
        Column::new("last_volume".into(), last_volume),
        date_column("last_date", rows.iter().map(|r| r.last_date))?,
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Write a DataFrame to a Parquet file, replacing any existing file.
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}
