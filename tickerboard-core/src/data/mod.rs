//! Market data: provider abstraction, Yahoo and in-memory providers, wide
//! table and loader.

pub mod circuit_breaker;
pub mod loader;
pub mod memory;
pub mod provider;
pub mod wide;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use loader::{load, load_adjusted, load_with_report, normalize, LoadOutcome};
pub use memory::InMemoryProvider;
pub use provider::{
    DataError, DataProvider, DownloadRequest, Field, FlatFrame, NestedFrame, PriceAdjustment,
    ProviderFrame,
};
pub use wide::{ColumnKey, WideTable};
pub use yahoo::{YahooProvider, YahooSettings};
