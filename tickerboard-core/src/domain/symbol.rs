//! Ticker symbol newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a tradable instrument: an equity ticker (`AAPL`), a crypto
/// pair (`BTC-USD`) or anything else the provider understands (`XAUUSD=X`).
///
/// Opaque and case-sensitive. The only validation is that it is non-empty
/// after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("symbol must not be empty")]
pub struct EmptySymbol;

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptySymbol> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptySymbol);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parse a list of raw strings, skipping blanks and keeping first occurrences only.
pub fn parse_symbols<I, S>(raw: I) -> Vec<Symbol>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<Symbol> = Vec::new();
    for item in raw {
        if let Ok(sym) = Symbol::new(item) {
            if !out.contains(&sym) {
                out.push(sym);
            }
        }
    }
    out
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = EmptySymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = EmptySymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank() {
        assert_eq!(Symbol::new(""), Err(EmptySymbol));
        assert_eq!(Symbol::new("   "), Err(EmptySymbol));
    }

    #[test]
    fn keeps_case_and_punctuation() {
        let s = Symbol::new(" XAUUSD=X ").unwrap();
        assert_eq!(s.as_str(), "XAUUSD=X");
        assert_ne!(Symbol::new("aapl").unwrap(), Symbol::new("AAPL").unwrap());
    }

    #[test]
    fn orders_lexicographically() {
        let mut v = vec![
            Symbol::new("TSLA").unwrap(),
            Symbol::new("AAPL").unwrap(),
            Symbol::new("BTC-USD").unwrap(),
        ];
        v.sort();
        let names: Vec<&str> = v.iter().map(Symbol::as_str).collect();
        assert_eq!(names, ["AAPL", "BTC-USD", "TSLA"]);
    }

    #[test]
    fn parse_symbols_dedups_and_skips_blanks() {
        let parsed = parse_symbols(["AAPL", "", "MSFT", "AAPL"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].as_str(), "AAPL");
        assert_eq!(parsed[1].as_str(), "MSFT");
    }

    #[test]
    fn serde_rejects_empty() {
        assert!(serde_json::from_str::<Symbol>("\"\"").is_err());
        let s: Symbol = serde_json::from_str("\"ETH-USD\"").unwrap();
        assert_eq!(s.as_str(), "ETH-USD");
    }
}
