use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{crossover::Crossover, macd::MacdSeries};

/// Display filter deciding which crossovers become chart markers.
///
/// A bullish crossover is drawn only while the signal line sits strictly
/// below `bullish_below`; a bearish one only while it sits strictly above
/// `bearish_above`. A `None` bound lets every crossover of that kind through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerFilter {
    pub bullish_below: Option<f64>,
    pub bearish_above: Option<f64>,
}

impl MarkerFilter {
    /// Filter that keeps every crossover.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn new(bullish_below: f64, bearish_above: f64) -> Self {
        Self {
            bullish_below: Some(bullish_below),
            bearish_above: Some(bearish_above),
        }
    }

    pub fn accepts(&self, kind: Crossover, signal: f64) -> bool {
        match kind {
            Crossover::None => false,
            Crossover::Bullish => self.bullish_below.is_none_or(|t| signal < t),
            Crossover::Bearish => self.bearish_above.is_none_or(|t| signal > t),
        }
    }
}

/// A crossover that passed the [`MarkerFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: Crossover,
    pub macd: f64,
    pub signal: f64,
}

/// Collects the markers to draw for `series`, in date order.
pub fn markers(series: &MacdSeries, filter: &MarkerFilter) -> Vec<Marker> {
    series
        .points()
        .enumerate()
        .filter(|(_, p)| filter.accepts(p.crossover, p.signal))
        .map(|(index, p)| Marker {
            index,
            date: p.date,
            kind: p.crossover,
            macd: p.macd,
            signal: p.signal,
        })
        .collect()
}
