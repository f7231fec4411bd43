use std::fmt;

use serde::{Deserialize, Serialize};

/// Crossover label for one time step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    /// No crossover on this step.
    #[default]
    None,
    /// MACD moved from at/below to strictly above the signal line.
    Bullish,
    /// MACD moved from at/above to strictly below the signal line.
    Bearish,
}

impl Crossover {
    /// Classifies the step from `(prev_macd, prev_signal)` to `(macd, signal)`.
    ///
    /// Equality on the previous step counts as "not yet crossed", so only the
    /// move out of equality fires and a run of equal steps fires once.
    pub fn between(prev_macd: f64, prev_signal: f64, macd: f64, signal: f64) -> Self {
        if prev_macd <= prev_signal && macd > signal {
            Crossover::Bullish
        } else if prev_macd >= prev_signal && macd < signal {
            Crossover::Bearish
        } else {
            Crossover::None
        }
    }

    pub fn is_event(self) -> bool {
        self != Crossover::None
    }

    /// Code written to CSV exports: 1 bullish, -1 bearish, 0 none.
    pub fn as_i8(self) -> i8 {
        match self {
            Crossover::None => 0,
            Crossover::Bullish => 1,
            Crossover::Bearish => -1,
        }
    }
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Crossover::None => "none",
            Crossover::Bullish => "bullish",
            Crossover::Bearish => "bearish",
        };
        f.write_str(s)
    }
}

/// Labels every index of two aligned lines. Index 0 is always
/// [`Crossover::None`] since it has no predecessor.
///
/// Both slices must have the same length; extra trailing values in the longer
/// one are ignored.
pub fn classify_crossovers(macd: &[f64], signal: &[f64]) -> Vec<Crossover> {
    let n = macd.len().min(signal.len());
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }
    out.push(Crossover::None);
    for i in 1..n {
        out.push(Crossover::between(macd[i - 1], signal[i - 1], macd[i], signal[i]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_cross_up_and_down() {
        assert_eq!(Crossover::between(-1.0, 0.0, 1.0, 0.0), Crossover::Bullish);
        assert_eq!(Crossover::between(1.0, 0.0, -1.0, 0.0), Crossover::Bearish);
        assert_eq!(Crossover::between(1.0, 0.0, 2.0, 0.0), Crossover::None);
        assert_eq!(Crossover::between(-1.0, 0.0, -2.0, 0.0), Crossover::None);
    }

    #[test]
    fn leaving_equality_fires() {
        assert_eq!(Crossover::between(0.5, 0.5, 0.6, 0.5), Crossover::Bullish);
        assert_eq!(Crossover::between(0.5, 0.5, 0.4, 0.5), Crossover::Bearish);
    }

    #[test]
    fn touching_without_crossing_does_not_fire() {
        // below → equal → below: the equal step itself never fires
        let macd = [-1.0, 0.0, -1.0];
        let signal = [0.0, 0.0, 0.0];
        assert_eq!(
            classify_crossovers(&macd, &signal),
            vec![Crossover::None, Crossover::None, Crossover::Bearish]
        );
    }

    #[test]
    fn run_of_equal_steps_fires_once() {
        let macd = [-1.0, 0.0, 0.0, 0.0, 1.0, 2.0];
        let signal = [0.0; 6];
        let out = classify_crossovers(&macd, &signal);
        assert_eq!(out.iter().filter(|c| **c == Crossover::Bullish).count(), 1);
        assert_eq!(out[4], Crossover::Bullish);
    }

    #[test]
    fn first_index_is_none() {
        assert_eq!(classify_crossovers(&[5.0], &[-5.0]), vec![Crossover::None]);
        assert!(classify_crossovers(&[], &[]).is_empty());
    }

    #[test]
    fn codes_and_names() {
        assert_eq!(Crossover::Bullish.as_i8(), 1);
        assert_eq!(Crossover::Bearish.as_i8(), -1);
        assert_eq!(Crossover::None.as_i8(), 0);
        assert_eq!(Crossover::Bearish.to_string(), "bearish");
        assert!(!Crossover::None.is_event());
    }
}
