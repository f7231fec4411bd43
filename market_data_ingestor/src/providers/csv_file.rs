//! Daily bars from a directory of `<SYMBOL>.csv` files.
//!
//! The expected layout is the common Yahoo-style export:
//!
//! ```text
//! Date,Open,High,Low,Close,Adj Close,Volume
//! 2024-01-02,187.15,188.44,183.88,185.64,185.40,82488700
//! ```
//!
//! Header names are matched case-insensitively for the usual spellings and
//! extra columns are ignored. Rows with `null` or empty prices (Yahoo writes
//! these for days without trading) are skipped.

use std::{
    io::ErrorKind,
    path::PathBuf,
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{
        bar::{Bar, EXCHANGE_TZ},
        bar_series::BarSeries,
        request_params::BarsRequestParams,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{
        CsvSnafu, DataProvider, InternalSnafu, IoSnafu, MissingDataDirSnafu, ProviderError,
        ProviderInitError, ValidationSnafu,
    },
};

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date", alias = "DATE", alias = "Datetime", alias = "timestamp")]
    date: String,
    #[serde(rename = "Open", alias = "open", deserialize_with = "nullable_f64")]
    open: Option<f64>,
    #[serde(rename = "High", alias = "high", deserialize_with = "nullable_f64")]
    high: Option<f64>,
    #[serde(rename = "Low", alias = "low", deserialize_with = "nullable_f64")]
    low: Option<f64>,
    #[serde(rename = "Close", alias = "close", deserialize_with = "nullable_f64")]
    close: Option<f64>,
    #[serde(rename = "Volume", alias = "volume", default, deserialize_with = "nullable_f64")]
    volume: Option<f64>,
}

/// A number, or `None` for an empty or `null` cell. Anything else is an error.
fn nullable_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| D::Error::custom(format!("invalid number '{raw}'")))
}

/// Reads daily bars from CSV files, one file per symbol.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    /// Fails when `dir` is not an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProviderInitError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return MissingDataDirSnafu { path: dir }.fail();
        }
        Ok(Self { dir })
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    async fn read_series(
        &self,
        symbol: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<BarSeries>, ProviderError> {
        let path = self.path_for(symbol);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("csv | no file for {symbol} at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e).context(IoSnafu { path }),
        };

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(raw.as_slice());
        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for record in reader.deserialize::<CsvRow>() {
            let row = record.context(CsvSnafu { path: path.clone() })?;
            let date = parse_date(&row.date).ok_or_else(|| {
                InternalSnafu {
                    message: format!("{}: unrecognised date '{}'", path.display(), row.date),
                }
                .build()
            })?;
            if date < from || date >= until {
                continue;
            }
            let (Some(open), Some(high), Some(low), Some(close)) = (row.open, row.high, row.low, row.close)
            else {
                skipped += 1;
                continue;
            };
            bars.push(Bar {
                timestamp: session_start(date)?,
                open,
                high,
                low,
                close,
                volume: row.volume.unwrap_or_default(),
                trade_count: None,
                vwap: None,
            });
        }

        if skipped > 0 {
            debug!("csv | skipped {skipped} row(s) without prices for {symbol}");
        }
        debug!("csv | {} rows in range for {symbol}", bars.len());
        Ok(Some(BarSeries::new(symbol, TimeFrame::day(), bars)))
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Midnight in exchange time, expressed in UTC, matching how daily bars are
/// stamped by the REST provider.
fn session_start(date: NaiveDate) -> Result<chrono::DateTime<Utc>, ProviderError> {
    EXCHANGE_TZ
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            InternalSnafu {
                message: format!("no local midnight for {date}"),
            }
            .build()
        })
}

#[async_trait]
impl DataProvider for CsvProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        if params.timeframe.unit != TimeFrameUnit::Day || params.timeframe.amount != 1 {
            return ValidationSnafu {
                message: format!("CSV files hold daily bars only, got {}", params.timeframe),
            }
            .fail();
        }

        let from = params.start.date_naive();
        let until = params.end.date_naive();
        let mut out = Vec::with_capacity(params.symbols.len());
        for symbol in &params.symbols {
            if let Some(series) = self.read_series(symbol, from, until).await? {
                out.push(series);
            }
        }
        Ok(out)
    }
}
