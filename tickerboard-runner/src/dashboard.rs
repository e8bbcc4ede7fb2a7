//! Dashboard pipeline: load (through the TTL cache) → reshape → summarise.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use tickerboard_core::data::{
    load_adjusted, DataError, DataProvider, LoadOutcome, PriceAdjustment, YahooProvider,
};
use tickerboard_core::domain::{DateRange, Period, RangeError, Symbol};
use tickerboard_core::{summarize, to_long, LongRow, SummaryRow, WideTable};

use crate::cache::{Clock, TtlCache};
use crate::config::DashboardConfig;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("invalid date range: {0}")]
    Range(#[from] RangeError),
    #[error("custom period selected without a start and end date")]
    MissingCustomRange,
}

/// Cache key: the exact request. Symbol order is significant, so the same
/// set selected in a different order is a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestKey {
    pub symbols: Vec<Symbol>,
    pub range: DateRange,
}

impl RequestKey {
    pub fn new(symbols: &[Symbol], range: DateRange) -> Self {
        Self {
            symbols: symbols.to_vec(),
            range,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedLoad {
    outcome: LoadOutcome,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnapshotStatus {
    /// Nothing selected; the provider was not called.
    NoSymbols,
    /// The provider returned nothing for the selection and period.
    NoData,
    Ready,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub key: RequestKey,
    #[serde(skip)]
    pub table: WideTable,
    pub rows: Vec<LongRow>,
    pub summary: Vec<SummaryRow>,
    pub unresolved: Vec<Symbol>,
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn status(&self) -> SnapshotStatus {
        if self.key.symbols.is_empty() {
            SnapshotStatus::NoSymbols
        } else if self.table.is_empty() {
            SnapshotStatus::NoData
        } else {
            SnapshotStatus::Ready
        }
    }

    /// Long rows of one symbol, dates ascending.
    pub fn series(&self, symbol: &Symbol) -> Vec<&LongRow> {
        let mut rows: Vec<&LongRow> = self.rows.iter().filter(|r| &r.symbol == symbol).collect();
        rows.sort_by_key(|r| r.date);
        rows
    }

    pub fn summary_for(&self, symbol: &Symbol) -> Option<&SummaryRow> {
        self.summary.iter().find(|r| &r.symbol == symbol)
    }
}

/// Date range for a period preset ending `today`, or the custom bounds.
pub fn resolve_range(
    period: Period,
    today: NaiveDate,
    custom: Option<(NaiveDate, NaiveDate)>,
) -> Result<DateRange, PipelineError> {
    if let Some(range) = period.range_ending(today) {
        return Ok(range);
    }
    let (start, end) = custom.ok_or(PipelineError::MissingCustomRange)?;
    Ok(DateRange::new(start, end)?)
}

/// Runs the pipeline against one provider, caching successful loads.
pub struct Dashboard {
    provider: Arc<dyn DataProvider>,
    cache: TtlCache<RequestKey, Arc<CachedLoad>>,
    adjustment: PriceAdjustment,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn DataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            cache: TtlCache::new(ttl),
            adjustment: PriceAdjustment::Adjusted,
        }
    }

    /// Expiry measured against `clock` instead of the system clock.
    pub fn with_clock(provider: Arc<dyn DataProvider>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            cache: TtlCache::with_clock(ttl, clock),
            adjustment: PriceAdjustment::Adjusted,
        }
    }

    /// Ask the provider for raw or split/dividend-adjusted prices.
    pub fn with_adjustment(mut self, adjustment: PriceAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    /// Yahoo-backed dashboard with provider and cache settings from `config`.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, PipelineError> {
        let breaker = Arc::new(config.circuit_breaker());
        let provider = YahooProvider::with_settings(breaker, config.yahoo_settings())?;
        Ok(Self::new(Arc::new(provider), config.cache_ttl()).with_adjustment(config.price_adjustment()))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cached_requests(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Serve from cache when a fresh result exists for the exact request.
    pub fn snapshot(
        &self,
        symbols: &[Symbol],
        range: DateRange,
    ) -> Result<DashboardSnapshot, PipelineError> {
        self.run(RequestKey::new(symbols, range), false)
    }

    /// Always hit the provider, then replace the cached result.
    pub fn refresh(
        &self,
        symbols: &[Symbol],
        range: DateRange,
    ) -> Result<DashboardSnapshot, PipelineError> {
        self.run(RequestKey::new(symbols, range), true)
    }

    fn run(&self, key: RequestKey, bypass_cache: bool) -> Result<DashboardSnapshot, PipelineError> {
        if key.symbols.is_empty() {
            let nothing = CachedLoad {
                outcome: LoadOutcome::default(),
                fetched_at: Utc::now(),
            };
            return Ok(assemble(key, Arc::new(nothing), false));
        }

        if !bypass_cache {
            if let Some(hit) = self.cache.get(&key) {
                debug!(symbols = key.symbols.len(), range = %key.range, "cache hit");
                return Ok(assemble(key, hit, true));
            }
        }

        debug!(symbols = key.symbols.len(), range = %key.range, bypass_cache, "loading");
        // No lock held here: two concurrent misses for one key both load.
        let outcome = load_adjusted(self.provider.as_ref(), &key.symbols, key.range, self.adjustment)?;
        let load = Arc::new(CachedLoad {
            outcome,
            fetched_at: Utc::now(),
        });
        let purged = self.cache.purge_expired();
        if purged > 0 {
            debug!(purged, "expired cache entries dropped");
        }
        self.cache.insert(key.clone(), Arc::clone(&load));

        let snapshot = assemble(key, load, false);
        info!(
            provider = self.provider.name(),
            symbols = snapshot.summary.len(),
            rows = snapshot.rows.len(),
            "dashboard data loaded"
        );
        Ok(snapshot)
    }
}

fn assemble(key: RequestKey, load: Arc<CachedLoad>, from_cache: bool) -> DashboardSnapshot {
    let rows = to_long(&load.outcome.table);
    let summary = summarize(&rows);
    DashboardSnapshot {
        key,
        table: load.outcome.table.clone(),
        rows,
        summary,
        unresolved: load.outcome.unresolved.clone(),
        from_cache,
        fetched_at: load.fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn preset_range_ends_today() {
        let r = resolve_range(Period::OneMonth, d(3, 31), None).unwrap();
        assert_eq!(r.start(), d(3, 1));
        assert_eq!(r.end(), d(3, 31));
    }

    #[test]
    fn custom_range_needs_bounds() {
        assert!(matches!(
            resolve_range(Period::Custom, d(3, 31), None),
            Err(PipelineError::MissingCustomRange)
        ));
        assert!(matches!(
            resolve_range(Period::Custom, d(3, 31), Some((d(3, 5), d(3, 1)))),
            Err(PipelineError::Range(_))
        ));
        let r = resolve_range(Period::Custom, d(3, 31), Some((d(1, 1), d(2, 1)))).unwrap();
        assert_eq!(r.days(), 31);
    }

    #[test]
    fn request_key_is_order_sensitive() {
        let range = DateRange::new(d(1, 1), d(2, 1)).unwrap();
        let a = Symbol::new("AAPL").unwrap();
        let b = Symbol::new("NVDA").unwrap();
        assert_ne!(
            RequestKey::new(&[a.clone(), b.clone()], range),
            RequestKey::new(&[b, a], range)
        );
    }
}
