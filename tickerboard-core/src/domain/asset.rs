//! Asset classes and their default symbol universes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::symbol::{parse_symbols, Symbol};

pub const DEFAULT_STOCKS: [&str; 6] = ["AAPL", "MSFT", "NVDA", "META", "TSLA", "GOOGL"];
pub const DEFAULT_CRYPTO: [&str; 4] = ["BTC-USD", "ETH-USD", "SOL-USD", "XAUUSD=X"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Stocks,
    Crypto,
}

impl AssetClass {
    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Stocks => "Stocks",
            AssetClass::Crypto => "Crypto",
        }
    }

    pub fn toggle(self) -> AssetClass {
        match self {
            AssetClass::Stocks => AssetClass::Crypto,
            AssetClass::Crypto => AssetClass::Stocks,
        }
    }

    /// Symbols offered in the selector for this class.
    pub fn default_universe(self) -> Vec<Symbol> {
        match self {
            AssetClass::Stocks => parse_symbols(DEFAULT_STOCKS),
            AssetClass::Crypto => parse_symbols(DEFAULT_CRYPTO),
        }
    }

    /// Symbols pre-selected when the class is first shown.
    pub fn default_selection(self) -> Vec<Symbol> {
        match self {
            AssetClass::Stocks => parse_symbols(["AAPL", "NVDA"]),
            AssetClass::Crypto => parse_symbols(["BTC-USD"]),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
