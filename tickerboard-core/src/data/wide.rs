//! Canonical wide table: one row per trading date, a `Close` and a `Volume`
//! group each holding one column per symbol.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::provider::{DataError, Field};
use crate::domain::Symbol;

/// Column key of the two-level (field, symbol) column structure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnKey {
    pub field: Field,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WideTable {
    dates: Vec<NaiveDate>,
    close: BTreeMap<Symbol, Vec<Option<f64>>>,
    volume: BTreeMap<Symbol, Vec<Option<u64>>>,
}

impl WideTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, checking that `dates` ascend strictly and that every
    /// column has one cell per date.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        close: BTreeMap<Symbol, Vec<Option<f64>>>,
        volume: BTreeMap<Symbol, Vec<Option<u64>>>,
    ) -> Result<Self, DataError> {
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::ValidationError(
                "date index must be strictly ascending".into(),
            ));
        }
        let n = dates.len();
        for (sym, col) in &close {
            if col.len() != n {
                return Err(DataError::ValidationError(format!(
                    "Close column for {sym} has {} cells, expected {n}",
                    col.len()
                )));
            }
        }
        for (sym, col) in &volume {
            if col.len() != n {
                return Err(DataError::ValidationError(format!(
                    "Volume column for {sym} has {} cells, expected {n}",
                    col.len()
                )));
            }
        }
        Ok(Self {
            dates,
            close,
            volume,
        })
    }

    /// No dates or no columns at all.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || (self.close.is_empty() && self.volume.is_empty())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn close(&self) -> &BTreeMap<Symbol, Vec<Option<f64>>> {
        &self.close
    }

    pub fn volume(&self) -> &BTreeMap<Symbol, Vec<Option<u64>>> {
        &self.volume
    }

    /// Symbols with a Close column, ascending.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.close.keys()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.close.contains_key(symbol)
    }

    /// Column keys, grouped by field (Close before Volume), symbols ascending.
    pub fn column_keys(&self) -> Vec<ColumnKey> {
        let close = self.close.keys().map(|s| ColumnKey {
            field: Field::Close,
            symbol: s.clone(),
        });
        let volume = self.volume.keys().map(|s| ColumnKey {
            field: Field::Volume,
            symbol: s.clone(),
        });
        close.chain(volume).collect()
    }

    /// Requested symbols that have no Close column, in request order.
    pub fn missing_from(&self, requested: &[Symbol]) -> Vec<Symbol> {
        requested
            .iter()
            .filter(|s| !self.contains(s))
            .cloned()
            .collect()
    }
}
