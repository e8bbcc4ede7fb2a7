//! Per-symbol period summary: last close, last volume and the percent change
//! from the first to the last observation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Symbol;
use crate::reshape::LongRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub symbol: Symbol,
    pub last_close: Option<f64>,
    /// `None` when the first close is absent or zero, or the last is absent.
    pub change_pct: Option<f64>,
    pub last_volume: Option<u64>,
    pub last_date: NaiveDate,
}

/// Summarise long rows into one row per symbol, sorted by symbol.
///
/// Rows are grouped by symbol and stably sorted by date within each group,
/// so input order does not matter.
pub fn summarize(rows: &[LongRow]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<&Symbol, Vec<&LongRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(&row.symbol).or_default().push(row);
    }

    groups
        .into_iter()
        .filter_map(|(symbol, mut group)| {
            group.sort_by_key(|r| r.date);
            let first = group.first()?;
            let last = group.last()?;
            Some(SummaryRow {
                symbol: symbol.clone(),
                last_close: last.close,
                change_pct: percent_change(first.close, last.close),
                last_volume: last.volume,
                last_date: last.date,
            })
        })
        .collect()
}

/// `(last - first) / first * 100`, or `None` if it cannot be computed.
pub fn percent_change(first: Option<f64>, last: Option<f64>) -> Option<f64> {
    let first = first.filter(|f| f.is_finite() && *f != 0.0)?;
    let last = last.filter(|l| l.is_finite())?;
    Some((last - first) / first * 100.0)
}
