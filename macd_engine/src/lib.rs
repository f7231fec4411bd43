//! MACD (Moving Average Convergence Divergence) over a daily closing-price series.
//!
//! The crate is a pure, synchronous transform. Given an ordered sequence of
//! [`PricePoint`]s it produces a [`MacdSeries`]: the MACD line, the signal line
//! and a [`Crossover`] label per input date, all aligned index-for-index with
//! the input.
//!
//! On top of the raw computation it offers the presentation helpers the chart
//! front end needs:
//! - [`Rescale`] to z-score or percentile-scale the two lines,
//! - [`MarkerFilter`] / [`markers`] to decide which crossovers get drawn,
//! - [`sma_series`] for the simple price moving averages drawn over the candles.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use macd_engine::{compute_macd, Crossover, MacdParams, PricePoint};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let points: Vec<PricePoint> = [10.0, 11.0, 12.0, 11.0, 10.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, close)| PricePoint::new(start + chrono::Days::new(i as u64), *close))
//!     .collect();
//!
//! let series = compute_macd(&points, &MacdParams::default()).unwrap();
//! assert_eq!(series.len(), points.len());
//! assert_eq!(series.crossovers()[0], Crossover::None);
//! ```

pub mod crossover;
pub mod ema;
pub mod error;
pub mod macd;
pub mod markers;
pub mod params;
pub mod rescale;
pub mod sma;

pub use crossover::{Crossover, classify_crossovers};
pub use ema::{Ema, ema_series};
pub use error::{MacdError, ZeroPeriodError};
pub use macd::{MacdPoint, MacdSeries, PricePoint, compute_macd};
pub use markers::{Marker, MarkerFilter, markers};
pub use params::MacdParams;
pub use rescale::Rescale;
pub use sma::{PRICE_MA_WINDOWS, sma_series};
