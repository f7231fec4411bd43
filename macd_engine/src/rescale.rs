//! Post-computation rescaling of the MACD and signal lines.
//!
//! The raw lines are in price units, which makes thresholds hard to compare
//! across tickers. Two alternative scales are offered:
//! - [`Rescale::Normalization`]: each line z-scored on its own mean and sample
//!   standard deviation, landing roughly in -2..2;
//! - [`Rescale::Percentile`]: the z-scores pushed through the standard normal
//!   CDF and mapped onto -100..100.
//!
//! Crossovers are re-classified on the rescaled lines, because the two lines
//! are scaled independently and can cross at different steps than the raw ones.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::macd::MacdSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rescale {
    #[default]
    Original,
    Normalization,
    Percentile,
}

impl Rescale {
    /// Returns a new series with both lines rescaled and crossovers
    /// re-classified. `Original` returns an identical copy.
    pub fn apply(self, series: &MacdSeries) -> MacdSeries {
        let dates = series.dates().to_vec();
        match self {
            Rescale::Original => series.clone(),
            Rescale::Normalization => MacdSeries::from_lines(
                dates,
                zscore(series.macd_line()),
                zscore(series.signal_line()),
            ),
            Rescale::Percentile => MacdSeries::from_lines(
                dates,
                percentile(series.macd_line()),
                percentile(series.signal_line()),
            ),
        }
    }

    /// Short human description of the scale, shown next to the chart.
    pub fn describe(self) -> &'static str {
        match self {
            Rescale::Original => "original data",
            Rescale::Normalization => "normalized data",
            Rescale::Percentile => "percentile data (numbers in %)",
        }
    }
}

impl fmt::Display for Rescale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rescale::Original => "original",
            Rescale::Normalization => "normalization",
            Rescale::Percentile => "percentile",
        };
        f.write_str(s)
    }
}

impl FromStr for Rescale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" | "raw" => Ok(Rescale::Original),
            "normalization" | "normalized" | "zscore" => Ok(Rescale::Normalization),
            "percentile" | "pct" => Ok(Rescale::Percentile),
            other => Err(format!(
                "unknown scale '{other}', expected original, normalization or percentile"
            )),
        }
    }
}

/// Z-scores `values` with the sample (n-1) standard deviation.
///
/// A line with fewer than two points, or with no spread, maps to all zeros.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    let std = var.sqrt();
    if !std.is_finite() || std == 0.0 {
        return vec![0.0; n];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

/// Z-scores `values`, then maps each score to `Φ(z)·200 − 100`.
pub fn percentile(values: &[f64]) -> Vec<f64> {
    let normal = Normal::standard();
    zscore(values)
        .into_iter()
        .map(|z| normal.cdf(z) * 200.0 - 100.0)
        .collect()
}
