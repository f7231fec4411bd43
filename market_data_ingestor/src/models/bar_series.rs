//! A collection of time-series bars for a specific symbol and timeframe.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Sorts bars by ascending timestamp and keeps one bar per trading date.
    ///
    /// When a date appears more than once the later bar in the original order
    /// wins. Returns the number of bars removed.
    pub fn normalize(&mut self) -> usize {
        let before = self.bars.len();
        // stable sort keeps the original order among equal timestamps
        self.bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut kept: Vec<Bar> = Vec::with_capacity(before);
        for bar in self.bars.drain(..) {
            match kept.last_mut() {
                Some(last) if last.trading_date() == bar.trading_date() => *last = bar,
                _ => kept.push(bar),
            }
        }
        self.bars = kept;
        before - self.bars.len()
    }

    /// `(trading date, close)` pairs in series order.
    pub fn closes(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.bars.iter().map(|b| (b.trading_date(), b.close))
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(Bar::trading_date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(Bar::trading_date)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn bar(day: u32, hour: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 2, day, hour, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            trade_count: None,
            vwap: None,
        }
    }

    #[test]
    fn normalize_sorts_and_dedups_by_trading_date() {
        let mut series = BarSeries::new(
            "AAPL",
            TimeFrame::day(),
            vec![bar(7, 5, 3.0), bar(5, 5, 1.0), bar(6, 5, 2.0), bar(6, 5, 2.5)],
        );
        let removed = series.normalize();

        assert_eq!(removed, 1);
        let closes: Vec<f64> = series.closes().map(|(_, c)| c).collect();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
        assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2024, 2, 5));
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 2, 7));
    }

    #[test]
    fn normalize_on_ordered_series_is_a_no_op() {
        let bars = vec![bar(5, 5, 1.0), bar(6, 5, 2.0)];
        let mut series = BarSeries::new("MSFT", TimeFrame::day(), bars.clone());
        assert_eq!(series.normalize(), 0);
        assert_eq!(series.bars, bars);
    }
}
