//! The MACD computation proper.
//!
//! 1. fast EMA and slow EMA of the closes,
//! 2. `macd[i] = fast[i] - slow[i]`,
//! 3. `signal` = EMA of the MACD line, seeded with `macd[0]`,
//! 4. crossovers between the two lines.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    crossover::{Crossover, classify_crossovers},
    ema::Ema,
    error::MacdError,
    params::MacdParams,
};

/// One `(date, close)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

impl From<(NaiveDate, f64)> for PricePoint {
    fn from((date, close): (NaiveDate, f64)) -> Self {
        Self { date, close }
    }
}

/// MACD output for a single date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub date: NaiveDate,
    pub macd: f64,
    pub signal: f64,
    pub crossover: Crossover,
}

/// Aligned MACD output: every vector has the length of the input sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    dates: Vec<NaiveDate>,
    macd_line: Vec<f64>,
    signal_line: Vec<f64>,
    crossover: Vec<Crossover>,
}

impl MacdSeries {
    /// Assembles a series from two aligned lines, classifying crossovers.
    pub(crate) fn from_lines(dates: Vec<NaiveDate>, macd_line: Vec<f64>, signal_line: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), macd_line.len());
        debug_assert_eq!(dates.len(), signal_line.len());
        let crossover = classify_crossovers(&macd_line, &signal_line);
        Self {
            dates,
            macd_line,
            signal_line,
            crossover,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always `false` for a series returned by [`compute_macd`].
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn macd_line(&self) -> &[f64] {
        &self.macd_line
    }

    pub fn signal_line(&self) -> &[f64] {
        &self.signal_line
    }

    pub fn crossovers(&self) -> &[Crossover] {
        &self.crossover
    }

    pub fn get(&self, index: usize) -> Option<MacdPoint> {
        Some(MacdPoint {
            date: *self.dates.get(index)?,
            macd: *self.macd_line.get(index)?,
            signal: *self.signal_line.get(index)?,
            crossover: *self.crossover.get(index)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = MacdPoint> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

/// Computes the MACD line, the signal line and the crossover labels.
///
/// `points` must be ordered by ascending date. Inputs shorter than
/// [`MacdParams::warmup_len`] are accepted; their early values are less
/// meaningful but still follow the recurrence exactly.
///
/// # Errors
///
/// [`MacdError::InsufficientData`] when `points` is empty. No partial output is
/// produced.
pub fn compute_macd(points: &[PricePoint], params: &MacdParams) -> Result<MacdSeries, MacdError> {
    if points.is_empty() {
        return Err(MacdError::InsufficientData);
    }
    if points.len() < params.warmup_len() {
        debug!(
            "compute_macd | {} points is below the {}-point warm-up; early values carry seed bias",
            points.len(),
            params.warmup_len()
        );
    }

    let mut fast = Ema::new(params.fast);
    let mut slow = Ema::new(params.slow);
    let mut signal = Ema::new(params.signal);

    let n = points.len();
    let mut dates = Vec::with_capacity(n);
    let mut macd_line = Vec::with_capacity(n);
    let mut signal_line = Vec::with_capacity(n);

    for point in points {
        let macd = fast.update(point.close) - slow.update(point.close);
        dates.push(point.date);
        macd_line.push(macd);
        signal_line.push(signal.update(macd));
    }

    Ok(MacdSeries::from_lines(dates, macd_line, signal_line))
}
