//! Yahoo Finance data provider.
//!
//! Fetches daily bars from Yahoo's v8 chart API. A batched download issues
//! one chart request per symbol, sequentially, and assembles the answers
//! into a single [`ProviderFrame`]. Handles retries with exponential
//! backoff, response parsing, split/dividend adjustment and the circuit
//! breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{
    DataError, DataProvider, DownloadRequest, Field, FlatFrame, NestedFrame, PriceAdjustment,
    ProviderFrame,
};
use crate::domain::{DateRange, Symbol};
use chrono::{NaiveDate, NaiveTime};
use reqwest::Url;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// One parsed daily row for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuoteRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl QuoteRow {
    fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Open => self.open,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Close => self.close,
            Field::Volume => self.volume,
        }
    }
}

const FIELDS: [Field; 5] = [Field::Open, Field::High, Field::Low, Field::Close, Field::Volume];

/// Connection settings for [`YahooProvider`].
#[derive(Debug, Clone)]
pub struct YahooSettings {
    pub chart_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub user_agent: String,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            chart_url: DEFAULT_CHART_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: YahooSettings,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Self::with_settings(circuit_breaker, YahooSettings::default())
    }

    pub fn with_settings(
        circuit_breaker: Arc<CircuitBreaker>,
        settings: YahooSettings,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            settings,
        })
    }

    /// Chart API URL for a symbol. `period2` is midnight UTC of the end
    /// date, so the end date itself is excluded.
    fn chart_url(&self, symbol: &Symbol, range: DateRange) -> Result<Url, DataError> {
        let start_ts = range.start().and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = range.end().and_time(NaiveTime::MIN).and_utc().timestamp();

        let mut url = Url::parse(&self.settings.chart_url)
            .map_err(|e| DataError::Other(format!("invalid chart url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Other("chart url cannot be a base".into()))?
            .pop_if_empty()
            .push(symbol.as_str());
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "div,splits")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    /// Execute a single symbol's request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &Symbol,
        range: DateRange,
        adjustment: PriceAdjustment,
    ) -> Result<Vec<QuoteRow>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.chart_url(symbol, range)?;
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.settings.base_delay, attempt);
                debug!(%symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        // IP ban
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(%symbol, retry_after, "rate limited by Yahoo");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let rows = parse_response(symbol, chart, adjustment)?;
                    self.circuit_breaker.record_success();
                    return Ok(rows);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(&self, request: &DownloadRequest) -> Result<ProviderFrame, DataError> {
        let total = request.symbols.len();
        let mut resolved = Vec::with_capacity(total);

        for (i, symbol) in request.symbols.iter().enumerate() {
            if request.progress {
                info!("[{}/{}] fetching {symbol}", i + 1, total);
            }
            match self.fetch_with_retry(symbol, request.range, request.adjustment) {
                Ok(rows) => resolved.push((symbol.clone(), rows)),
                Err(e) if e.is_symbol_scoped() => {
                    warn!(%symbol, error = %e, "dropping unresolved symbol");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(requested = total, resolved = resolved.len(), "batch download done");
        Ok(assemble(total, resolved))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

/// Parse a chart response into daily rows, applying price adjustment.
fn parse_response(
    symbol: &Symbol,
    resp: ChartResponse,
    adjustment: PriceAdjustment,
) -> Result<Vec<QuoteRow>, DataError> {
    let result = resp.chart.result.ok_or_else(|| {
        if let Some(err) = resp.chart.error {
            if err.code == "Not Found" {
                DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            } else {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
        } else {
            DataError::ResponseFormatChanged("empty result with no error".into())
        }
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    // A valid symbol with no trading days in range comes back without timestamps.
    let Some(timestamps) = data.timestamp else {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    };

    let gmt_offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);

    let mut rows = Vec::with_capacity(timestamps.len());

    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts + gmt_offset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();
        let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

        // Skip rows where everything is null (holidays, halted sessions)
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        let row = match adjustment {
            PriceAdjustment::Raw => QuoteRow {
                date,
                open,
                high,
                low,
                close,
                volume,
            },
            PriceAdjustment::Adjusted => adjust_row(date, open, high, low, close, adj_close, volume),
        };
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        });
    }

    Ok(rows)
}

/// `base * 2^(attempt - 1)`, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

/// Scale open/high/low by `adj_close / close` and report the adjusted close.
fn adjust_row(
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    adj_close: Option<f64>,
    volume: Option<f64>,
) -> QuoteRow {
    let ratio = match (adj_close, close) {
        (Some(adj), Some(raw)) if raw != 0.0 && raw.is_finite() => Some(adj / raw),
        _ => None,
    };
    match ratio {
        Some(r) => QuoteRow {
            date,
            open: open.map(|v| v * r),
            high: high.map(|v| v * r),
            low: low.map(|v| v * r),
            close: adj_close,
            volume,
        },
        None => QuoteRow {
            date,
            open,
            high,
            low,
            close: adj_close.or(close),
            volume,
        },
    }
}

/// Build the batch response. One requested symbol gives a flat frame; more
/// than one gives a nested frame over the union of all dates. Within a
/// symbol, the last row for a repeated date wins.
pub(crate) fn assemble(requested: usize, resolved: Vec<(Symbol, Vec<QuoteRow>)>) -> ProviderFrame {
    if resolved.is_empty() {
        return ProviderFrame::Empty;
    }

    let by_date: Vec<(Symbol, BTreeMap<NaiveDate, QuoteRow>)> = resolved
        .into_iter()
        .map(|(sym, rows)| (sym, rows.into_iter().map(|r| (r.date, r)).collect()))
        .collect();

    if requested == 1 && by_date.len() == 1 {
        let (_, rows) = &by_date[0];
        let dates: Vec<NaiveDate> = rows.keys().copied().collect();
        let columns: BTreeMap<Field, Vec<Option<f64>>> = FIELDS
            .iter()
            .map(|&field| (field, rows.values().map(|r| r.get(field)).collect::<Vec<_>>()))
            .collect();
        return ProviderFrame::Flat(FlatFrame { dates, columns });
    }

    let dates: Vec<NaiveDate> = by_date
        .iter()
        .flat_map(|(_, rows)| rows.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut columns: BTreeMap<Field, BTreeMap<Symbol, Vec<Option<f64>>>> = BTreeMap::new();
    for &field in &FIELDS {
        let group = columns.entry(field).or_default();
        for (sym, rows) in &by_date {
            let column: Vec<Option<f64>> = dates
                .iter()
                .map(|d| rows.get(d).and_then(|r| r.get(field)))
                .collect();
            group.insert(sym.clone(), column);
        }
    }

    ProviderFrame::Nested(NestedFrame { dates, columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const SAMPLE: &str = r#"{
      "chart": {
        "result": [{
          "meta": {"symbol": "AAPL", "gmtoffset": -18000},
          "timestamp": [1704205800, 1704292200, 1704378600],
          "indicators": {
            "quote": [{
              "open":   [187.15, null, 182.15],
              "high":   [188.44, null, 183.09],
              "low":    [183.89, null, 180.88],
              "close":  [185.64, null, 181.91],
              "volume": [82488700, null, 71983600]
            }],
            "adjclose": [{"adjclose": [92.82, null, 90.955]}]
          }
        }],
        "error": null
      }
    }"#;

    #[test]
    fn parse_applies_adjustment_and_skips_null_rows() {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let rows = parse_response(&sym("AAPL"), resp, PriceAdjustment::Adjusted).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 1, 2));
        assert_eq!(rows[1].date, d(2024, 1, 4));
        assert_eq!(rows[0].close, Some(92.82));
        let open = rows[0].open.unwrap();
        assert!((open - 187.15 * 0.5).abs() < 1e-9);
        assert_eq!(rows[0].volume, Some(82_488_700.0));
    }

    #[test]
    fn parse_raw_keeps_unadjusted_close() {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let rows = parse_response(&sym("AAPL"), resp, PriceAdjustment::Raw).unwrap();
        assert_eq!(rows[0].close, Some(185.64));
        assert_eq!(rows[0].open, Some(187.15));
    }

    #[test]
    fn gmt_offset_moves_late_utc_timestamps_back() {
        // 2024-01-03 02:00 UTC is still 2024-01-02 in New York.
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},
            "timestamp":[1704247200],
            "indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[1.0],"close":[1.0],"volume":[5]}]}}],
            "error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let rows = parse_response(&sym("X"), resp, PriceAdjustment::Adjusted).unwrap();
        assert_eq!(rows[0].date, d(2024, 1, 2));
        // No adjclose series: close passes through.
        assert_eq!(rows[0].close, Some(1.0));
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_response(&sym("NOPE"), resp, PriceAdjustment::Adjusted).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "NOPE"));
        assert!(err.is_symbol_scoped());
    }

    #[test]
    fn missing_timestamps_means_no_data() {
        let json = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_response(&sym("AAPL"), resp, PriceAdjustment::Adjusted).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    fn row(date: NaiveDate, close: f64, volume: f64) -> QuoteRow {
        QuoteRow {
            date,
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(volume),
        }
    }

    #[test]
    fn single_request_assembles_flat_frame() {
        let frame = assemble(
            1,
            vec![(sym("AAPL"), vec![row(d(2024, 1, 2), 10.0, 1.0), row(d(2024, 1, 3), 11.0, 2.0)])],
        );
        let ProviderFrame::Flat(flat) = frame else {
            panic!("expected flat frame");
        };
        assert_eq!(flat.dates, vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert_eq!(flat.columns[&Field::Close], vec![Some(10.0), Some(11.0)]);
        assert_eq!(flat.columns.len(), 5);
    }

    #[test]
    fn multi_request_assembles_nested_frame_over_union_of_dates() {
        let frame = assemble(
            3,
            vec![
                (sym("BTC-USD"), vec![row(d(2024, 1, 6), 40_000.0, 9.0), row(d(2024, 1, 8), 41_000.0, 8.0)]),
                (sym("AAPL"), vec![row(d(2024, 1, 8), 180.0, 7.0)]),
            ],
        );
        let ProviderFrame::Nested(nested) = frame else {
            panic!("expected nested frame");
        };
        assert_eq!(nested.dates, vec![d(2024, 1, 6), d(2024, 1, 8)]);
        let close = &nested.columns[&Field::Close];
        assert_eq!(close[&sym("AAPL")], vec![None, Some(180.0)]);
        assert_eq!(close[&sym("BTC-USD")], vec![Some(40_000.0), Some(41_000.0)]);
    }

    #[test]
    fn multi_request_with_one_survivor_stays_nested() {
        let frame = assemble(2, vec![(sym("AAPL"), vec![row(d(2024, 1, 2), 1.0, 1.0)])]);
        assert!(matches!(frame, ProviderFrame::Nested(_)));
        assert_eq!(assemble(2, Vec::new()), ProviderFrame::Empty);
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let frame = assemble(
            1,
            vec![(sym("AAPL"), vec![row(d(2024, 1, 2), 1.0, 1.0), row(d(2024, 1, 2), 2.0, 3.0)])],
        );
        let ProviderFrame::Flat(flat) = frame else {
            panic!("expected flat frame");
        };
        assert_eq!(flat.dates.len(), 1);
        assert_eq!(flat.columns[&Field::Close], vec![Some(2.0)]);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), base);
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
        assert_eq!(backoff_delay(Duration::MAX, 2), Duration::MAX);
    }

    #[test]
    fn chart_url_encodes_symbol_and_range() {
        let provider = YahooProvider::new(Arc::new(CircuitBreaker::default_provider())).unwrap();
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 2)).unwrap();
        let url = provider.chart_url(&sym("XAUUSD=X"), range).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/XAUUSD"));
        assert!(s.contains("period1=1704067200"));
        assert!(s.contains("period2=1704153600"));
        assert!(s.contains("interval=1d"));
    }
}
