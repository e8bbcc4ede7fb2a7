//! Loader: one batched provider download, normalised into a [`WideTable`].
//!
//! The provider's response shape depends on how many symbols were asked
//! for. [`normalize`] is the single place that branches on that shape;
//! everything downstream sees the same two-level (field, symbol) layout.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::provider::{DataError, DataProvider, DownloadRequest, Field, PriceAdjustment, ProviderFrame};
use super::wide::WideTable;
use crate::domain::{DateRange, Symbol};

/// A loaded table plus the requested symbols that did not make it into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub table: WideTable,
    /// Requested symbols without a Close column, in request order.
    pub unresolved: Vec<Symbol>,
}

/// Load adjusted daily Close/Volume for `symbols` over `range`.
///
/// An empty selection returns an empty table without touching the provider.
/// Symbols the provider cannot resolve are silently left out.
pub fn load(
    provider: &dyn DataProvider,
    symbols: &[Symbol],
    range: DateRange,
) -> Result<WideTable, DataError> {
    load_with_report(provider, symbols, range).map(|outcome| outcome.table)
}

/// Same as [`load`], also reporting which symbols went missing.
pub fn load_with_report(
    provider: &dyn DataProvider,
    symbols: &[Symbol],
    range: DateRange,
) -> Result<LoadOutcome, DataError> {
    load_adjusted(provider, symbols, range, PriceAdjustment::Adjusted)
}

/// [`load_with_report`] with an explicit price adjustment.
///
/// A provider that reports itself unavailable (rate-limited or blocked) is
/// not asked at all.
pub fn load_adjusted(
    provider: &dyn DataProvider,
    symbols: &[Symbol],
    range: DateRange,
    adjustment: PriceAdjustment,
) -> Result<LoadOutcome, DataError> {
    if symbols.is_empty() {
        debug!("empty selection, skipping download");
        return Ok(LoadOutcome::default());
    }
    if !provider.is_available() {
        return Err(DataError::CircuitBreakerTripped);
    }

    let request = DownloadRequest {
        adjustment,
        ..DownloadRequest::adjusted(symbols.to_vec(), range)
    };
    debug!(
        provider = provider.name(),
        symbols = symbols.len(),
        %range,
        ?adjustment,
        "downloading"
    );
    let frame = provider.download(&request)?;
    let table = normalize(symbols, frame)?;

    let unresolved = table.missing_from(symbols);
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(Symbol::as_str).collect();
        info!(unresolved = ?names, "some symbols returned no data");
    }

    Ok(LoadOutcome { table, unresolved })
}

/// Convert a provider response into the canonical wide table.
///
/// `requested` is the symbol list the request was made with; a flat frame
/// carries no symbol of its own and is labelled with the sole requested one.
pub fn normalize(requested: &[Symbol], frame: ProviderFrame) -> Result<WideTable, DataError> {
    match frame {
        ProviderFrame::Empty => Ok(WideTable::empty()),
        ProviderFrame::Flat(mut flat) => {
            let [symbol] = requested else {
                return Err(DataError::ValidationError(format!(
                    "flat provider frame returned for {} requested symbols",
                    requested.len()
                )));
            };
            let mut close = BTreeMap::new();
            if let Some(col) = flat.columns.remove(&Field::Close) {
                close.insert(symbol.clone(), col);
            }
            let mut volume = BTreeMap::new();
            if let Some(col) = flat.columns.remove(&Field::Volume) {
                volume.insert(symbol.clone(), col);
            }
            build(flat.dates, close, volume)
        }
        ProviderFrame::Nested(mut nested) => {
            let close = nested.columns.remove(&Field::Close).unwrap_or_default();
            let volume = nested.columns.remove(&Field::Volume).unwrap_or_default();
            build(nested.dates, close, volume)
        }
    }
}

fn build(
    dates: Vec<NaiveDate>,
    mut close: BTreeMap<Symbol, Vec<Option<f64>>>,
    volume: BTreeMap<Symbol, Vec<Option<f64>>>,
) -> Result<WideTable, DataError> {
    if dates.is_empty() {
        return Ok(WideTable::empty());
    }

    // A symbol without a single close is treated as unresolved.
    close.retain(|_, col| col.iter().any(|v| v.is_some_and(f64::is_finite)));

    let close: BTreeMap<Symbol, Vec<Option<f64>>> = close
        .into_iter()
        .map(|(sym, col)| (sym, col.into_iter().map(|v| v.filter(|x| x.is_finite())).collect()))
        .collect();

    let volume: BTreeMap<Symbol, Vec<Option<u64>>> = volume
        .into_iter()
        .filter(|(sym, _)| close.contains_key(sym))
        .map(|(sym, col)| (sym, col.into_iter().map(to_volume).collect()))
        .collect();

    if close.is_empty() {
        return Ok(WideTable::empty());
    }

    WideTable::from_columns(dates, close, volume)
}

fn to_volume(v: Option<f64>) -> Option<u64> {
    v.filter(|x| x.is_finite() && *x >= 0.0).map(|x| x.round() as u64)
}
