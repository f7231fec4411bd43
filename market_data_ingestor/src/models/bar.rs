//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is used as the standard output for all [`DataProvider`](crate::providers::DataProvider)
//! implementations.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::{America::New_York, Tz};
use serde::{Deserialize, Serialize};

/// Time zone in which US equity trading dates are counted.
pub const EXCHANGE_TZ: Tz = New_York;

/// A single time-series bar (OHLCV) for a given timestamp.
///
/// This struct is vendor-agnostic and is used throughout the data ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// The timestamp for this bar (UTC). Daily bars are stamped at the start
    /// of the trading day in exchange time.
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,

    /// Trade count for the bar. Not all providers supply this.
    pub trade_count: Option<u64>,

    /// Volume-weighted average price. Not all providers supply this.
    pub vwap: Option<f64>,
}

impl Bar {
    /// Calendar date of this bar in the exchange time zone.
    pub fn trading_date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&EXCHANGE_TZ).date_naive()
    }
}
