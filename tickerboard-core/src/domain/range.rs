//! Date ranges and the preset look-back periods offered by the dashboard.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("unknown period '{0}' (expected 1M, 3M, 6M, 1Y or custom)")]
    UnknownPeriod(String),
}

/// Calendar date window `[start, end]` with `start <= end`.
///
/// The provider treats `end` as exclusive: a daily bar dated `end` is not
/// part of the download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Preset look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1M")]
    OneMonth,
    #[default]
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "custom", alias = "Custom")]
    Custom,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::Custom,
    ];

    /// Look-back length in calendar days. `Custom` has none.
    pub fn lookback_days(self) -> Option<i64> {
        match self {
            Period::OneMonth => Some(30),
            Period::ThreeMonths => Some(90),
            Period::SixMonths => Some(180),
            Period::OneYear => Some(365),
            Period::Custom => None,
        }
    }

    /// Window of `lookback_days` ending at `end`. `Custom` yields `None`;
    /// the caller supplies its own start date.
    pub fn range_ending(self, end: NaiveDate) -> Option<DateRange> {
        let days = self.lookback_days()?;
        Some(DateRange {
            start: end - Duration::days(days),
            end,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::OneYear => "1Y",
            Period::Custom => "Custom",
        }
    }

    pub fn next(self) -> Period {
        let idx = Period::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Period::ALL[(idx + 1) % Period::ALL.len()]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Ok(Period::OneMonth),
            "3M" => Ok(Period::ThreeMonths),
            "6M" => Ok(Period::SixMonths),
            "1Y" => Ok(Period::OneYear),
            "CUSTOM" => Ok(Period::Custom),
            _ => Err(RangeError::UnknownPeriod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn range_rejects_inverted_dates() {
        assert!(DateRange::new(d(2024, 2, 1), d(2024, 1, 1)).is_err());
        let same = DateRange::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(same.days(), 0);
    }

    #[test]
    fn presets_look_back_from_end() {
        let end = d(2024, 4, 1);
        let r = Period::ThreeMonths.range_ending(end).unwrap();
        assert_eq!(r.start(), d(2024, 1, 2));
        assert_eq!(r.end(), end);
        assert_eq!(Period::OneYear.range_ending(end).unwrap().days(), 365);
        assert!(Period::Custom.range_ending(end).is_none());
    }

    #[test]
    fn parse_and_cycle() {
        assert_eq!("1y".parse::<Period>().unwrap(), Period::OneYear);
        assert_eq!("custom".parse::<Period>().unwrap(), Period::Custom);
        assert!("2W".parse::<Period>().is_err());
        assert_eq!(Period::Custom.next(), Period::OneMonth);
        assert_eq!(Period::default(), Period::ThreeMonths);
    }

    #[test]
    fn serde_uses_short_labels() {
        assert_eq!(serde_json::to_string(&Period::SixMonths).unwrap(), "\"6M\"");
        let p: Period = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(p, Period::Custom);
    }
}
