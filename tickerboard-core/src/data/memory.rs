//! In-memory provider backed by fixed daily series.
//!
//! Answers downloads with the same frame shapes as the Yahoo provider, which
//! makes it the stand-in for the network in tests and benchmarks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;

use super::provider::{DataError, DataProvider, DownloadRequest, PriceAdjustment, ProviderFrame};
use super::yahoo::{assemble, QuoteRow};
use crate::domain::Symbol;

#[derive(Debug, Default)]
pub struct InMemoryProvider {
    series: BTreeMap<Symbol, Vec<QuoteRow>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    unavailable: AtomicBool,
    last_adjustment: Mutex<Option<PriceAdjustment>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a daily series of `(date, close, volume)` for `symbol`.
    pub fn with_series(
        mut self,
        symbol: Symbol,
        rows: impl IntoIterator<Item = (NaiveDate, Option<f64>, Option<f64>)>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|(date, close, volume)| QuoteRow {
                date,
                open: close,
                high: close,
                low: close,
                close,
                volume,
            })
            .collect();
        self.series.insert(symbol, rows);
        self
    }

    /// Number of `download` calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following download fail as if the network were down.
    /// `None` restores normal service.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = message.map(str::to_string);
    }

    /// Toggle what `is_available` reports, e.g. to mimic a tripped breaker.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Adjustment asked for by the most recent download.
    pub fn last_adjustment(&self) -> Option<PriceAdjustment> {
        *self.last_adjustment.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn download(&self, request: &DownloadRequest) -> Result<ProviderFrame, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_adjustment.lock().unwrap_or_else(PoisonError::into_inner) = Some(request.adjustment);
        if let Some(msg) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(DataError::NetworkUnreachable(msg));
        }

        let (start, end) = (request.range.start(), request.range.end());
        let resolved = request
            .symbols
            .iter()
            .filter_map(|sym| {
                let rows: Vec<QuoteRow> = self
                    .series
                    .get(sym)?
                    .iter()
                    .filter(|r| r.date >= start && r.date < end)
                    .cloned()
                    .collect();
                (!rows.is_empty()).then(|| (sym.clone(), rows))
            })
            .collect();

        Ok(assemble(request.symbols.len(), resolved))
    }

    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DateRange;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_series(sym("AAPL"), [(d(1), Some(1.0), Some(10.0)), (d(2), Some(2.0), None)])
            .with_series(sym("MSFT"), [(d(2), Some(5.0), Some(50.0))])
    }

    #[test]
    fn end_date_is_exclusive() {
        let p = provider();
        let req = DownloadRequest::adjusted(vec![sym("AAPL")], DateRange::new(d(1), d(2)).unwrap());
        match p.download(&req).unwrap() {
            ProviderFrame::Flat(f) => assert_eq!(f.dates, vec![d(1)]),
            other => panic!("expected flat frame, got {other:?}"),
        }
    }

    #[test]
    fn several_symbols_give_nested_frame() {
        let p = provider();
        let req = DownloadRequest::adjusted(
            vec![sym("AAPL"), sym("MSFT"), sym("NOPE")],
            DateRange::new(d(1), d(10)).unwrap(),
        );
        match p.download(&req).unwrap() {
            ProviderFrame::Nested(f) => assert_eq!(f.dates, vec![d(1), d(2)]),
            other => panic!("expected nested frame, got {other:?}"),
        }
        assert_eq!(p.calls(), 1);
    }

    #[test]
    fn failure_switch() {
        let p = provider();
        let req = DownloadRequest::adjusted(vec![sym("AAPL")], DateRange::new(d(1), d(3)).unwrap());
        p.set_failure(Some("offline"));
        assert!(matches!(p.download(&req), Err(DataError::NetworkUnreachable(_))));
        p.set_failure(None);
        assert!(p.download(&req).is_ok());
        assert_eq!(p.calls(), 2);
    }
}
