use std::num::NonZeroU32;

/// Exponential moving average kept as a single running value.
///
/// Behaviour (the `adjust=False` convention):
///   sample 0  → value = x
///   sample 1+ → value = x·k + prev·(1−k)   where k = 2/(period+1)
///
/// Only the previous value is retained, so feeding `n` samples is O(n) and the
/// rounding follows the recurrence step by step.
#[derive(Debug, Clone)]
pub struct Ema {
    k: f64,
    value: f64,
    count: u64,
}

impl Ema {
    pub fn new(period: NonZeroU32) -> Self {
        Self {
            k: 2.0 / (f64::from(period.get()) + 1.0),
            value: 0.0,
            count: 0,
        }
    }

    /// Feed one observation, return the current EMA value.
    pub fn update(&mut self, x: f64) -> f64 {
        if self.count == 0 {
            self.value = x;
        } else {
            self.value = x * self.k + self.value * (1.0 - self.k);
        }
        self.count += 1;
        self.value
    }

    /// Current value; `None` before the first observation.
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.value)
    }
}

/// EMA of every prefix of `values`, seeded with `values[0]`.
///
/// Returns an empty vector for empty input.
pub fn ema_series(values: &[f64], period: NonZeroU32) -> Vec<f64> {
    let mut ema = Ema::new(period);
    values.iter().map(|&x| ema.update(x)).collect()
}
