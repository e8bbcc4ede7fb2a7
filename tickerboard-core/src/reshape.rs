//! Wide → long reshaping.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::WideTable;
use crate::domain::Symbol;

/// One (date, symbol) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub date: NaiveDate,
    pub symbol: Symbol,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Melt the Close and Volume groups and left-join volume onto close on
/// (date, symbol).
///
/// Every Close cell produces a row, absent values included. A (date, symbol)
/// pair that only appears in the Volume group is dropped. Rows come out
/// symbol by symbol, each symbol's dates ascending.
pub fn to_long(table: &WideTable) -> Vec<LongRow> {
    if table.is_empty() {
        return Vec::new();
    }

    let dates = table.dates();
    let volume: HashMap<(NaiveDate, &Symbol), Option<u64>> = table
        .volume()
        .iter()
        .flat_map(|(sym, col)| dates.iter().zip(col).map(move |(d, v)| ((*d, sym), *v)))
        .collect();

    table
        .close()
        .iter()
        .flat_map(|(sym, col)| {
            let volume = &volume;
            dates.iter().zip(col).map(move |(d, close)| LongRow {
                date: *d,
                symbol: sym.clone(),
                close: *close,
                volume: volume.get(&(*d, sym)).copied().flatten(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn empty_table_gives_no_rows() {
        assert!(to_long(&WideTable::empty()).is_empty());
    }

    #[test]
    fn one_row_per_close_cell() {
        let close = BTreeMap::from([
            (sym("AAPL"), vec![Some(1.0), None, Some(3.0)]),
            (sym("NVDA"), vec![Some(4.0), Some(5.0), Some(6.0)]),
        ]);
        let volume = BTreeMap::from([
            (sym("AAPL"), vec![Some(10), Some(20), None]),
            (sym("NVDA"), vec![Some(40), Some(50), Some(60)]),
        ]);
        let table = WideTable::from_columns(vec![d(2), d(3), d(4)], close, volume).unwrap();
        let rows = to_long(&table);
        assert_eq!(rows.len(), 6);

        let aapl: Vec<_> = rows.iter().filter(|r| r.symbol.as_str() == "AAPL").collect();
        assert_eq!(aapl[1].close, None);
        assert_eq!(aapl[1].volume, Some(20));
        assert_eq!(aapl[2].volume, None);
    }

    #[test]
    fn volume_only_symbols_are_dropped() {
        let close = BTreeMap::from([(sym("AAPL"), vec![Some(1.0)])]);
        let volume = BTreeMap::from([(sym("AAPL"), vec![Some(7)]), (sym("GHOST"), vec![Some(9)])]);
        let table = WideTable::from_columns(vec![d(2)], close, volume).unwrap();
        let rows = to_long(&table);
        assert_eq!(
            rows,
            vec![LongRow {
                date: d(2),
                symbol: sym("AAPL"),
                close: Some(1.0),
                volume: Some(7),
            }]
        );
    }

    #[test]
    fn close_without_volume_column_has_absent_volume() {
        let close = BTreeMap::from([(sym("BTC-USD"), vec![Some(1.0), Some(2.0)])]);
        let table = WideTable::from_columns(vec![d(6), d(7)], close, BTreeMap::new()).unwrap();
        assert!(to_long(&table).iter().all(|r| r.volume.is_none()));
    }
}
