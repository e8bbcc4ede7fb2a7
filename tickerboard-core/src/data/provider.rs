//! Data provider trait, raw response shapes and structured error types.
//!
//! The DataProvider trait abstracts over market data sources so the loader
//! can be exercised against an in-memory provider in tests. A provider
//! answers one batched download per request and hands back a
//! [`ProviderFrame`] whose shape depends on how many symbols were asked for;
//! the loader is the only code that looks at that shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::domain::{DateRange, Symbol};

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True for errors that concern one symbol only. The rest of a batch
    /// download can still succeed.
    pub fn is_symbol_scoped(&self) -> bool {
        matches!(
            self,
            DataError::SymbolNotFound { .. } | DataError::ResponseFormatChanged(_)
        )
    }
}

/// Column family of a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Open => "Open",
            Field::High => "High",
            Field::Low => "Low",
            Field::Close => "Close",
            Field::Volume => "Volume",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether historical prices are corrected for splits and dividends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceAdjustment {
    #[default]
    Adjusted,
    Raw,
}

/// One batched historical-quotes request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub symbols: Vec<Symbol>,
    pub range: DateRange,
    pub adjustment: PriceAdjustment,
    /// Print per-symbol progress while downloading.
    pub progress: bool,
}

impl DownloadRequest {
    /// Adjusted prices, no progress output.
    pub fn adjusted(symbols: Vec<Symbol>, range: DateRange) -> Self {
        Self {
            symbols,
            range,
            adjustment: PriceAdjustment::Adjusted,
            progress: false,
        }
    }
}

/// Single-symbol response: one column per field, the symbol is implicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<Field, Vec<Option<f64>>>,
}

/// Multi-symbol response: field → symbol → column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: BTreeMap<Field, BTreeMap<Symbol, Vec<Option<f64>>>>,
}

/// Raw provider response. Every column is aligned with its frame's
/// ascending `dates` index.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderFrame {
    Empty,
    Flat(FlatFrame),
    Nested(NestedFrame),
}

impl ProviderFrame {
    pub fn is_empty(&self) -> bool {
        match self {
            ProviderFrame::Empty => true,
            ProviderFrame::Flat(f) => f.dates.is_empty() || f.columns.is_empty(),
            ProviderFrame::Nested(f) => f.dates.is_empty() || f.columns.is_empty(),
        }
    }
}

/// Trait for market data providers.
///
/// Implementations handle the specifics of talking to one source. Result
/// caching sits above this trait; providers don't know about it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Download daily series for every requested symbol in one call.
    ///
    /// Symbols the provider cannot resolve are left out of the frame rather
    /// than reported as errors. An `Err` means the request as a whole failed.
    fn download(&self, request: &DownloadRequest) -> Result<ProviderFrame, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
