//! Tickerboard Core: symbols, date ranges, market data loading, wide → long
//! reshaping and per-symbol period summaries.
//!
//! The pipeline is three pure-ish stages:
//! - [`data::load`] turns symbols and a date range into a [`data::WideTable`]
//!   with a single batched provider download
//! - [`reshape::to_long`] melts the wide table into (date, symbol) rows
//! - [`summary::summarize`] reduces those rows to one [`summary::SummaryRow`]
//!   per symbol
//!
//! Formatting lives in [`format`] and is only used at the presentation edge.

pub mod data;
pub mod domain;
pub mod format;
pub mod frame;
pub mod reshape;
pub mod summary;

pub use data::{load, load_with_report, DataError, DataProvider, LoadOutcome, WideTable};
pub use domain::{AssetClass, DateRange, Period, Symbol};
pub use reshape::{to_long, LongRow};
pub use summary::{summarize, SummaryRow};
