//! Domain types: symbols, date ranges, look-back presets, asset classes.

pub mod asset;
pub mod range;
pub mod symbol;

pub use asset::AssetClass;
pub use range::{DateRange, Period, RangeError};
pub use symbol::{parse_symbols, EmptySymbol, Symbol};
