use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::ZeroPeriodError;

const DEFAULT_FAST: NonZeroU32 = NonZeroU32::new(12).unwrap();
const DEFAULT_SLOW: NonZeroU32 = NonZeroU32::new(26).unwrap();
const DEFAULT_SIGNAL: NonZeroU32 = NonZeroU32::new(9).unwrap();

/// Smoothing windows for the MACD computation.
///
/// `fast < slow` is the usual convention but is not enforced; the output is
/// still well defined when it is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    /// Fast EMA period (default: 12).
    pub fast: NonZeroU32,
    /// Slow EMA period (default: 26).
    pub slow: NonZeroU32,
    /// Signal line EMA period (default: 9).
    pub signal: NonZeroU32,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    /// Builds parameters from raw integers, rejecting zero periods.
    pub fn new(fast: u32, slow: u32, signal: u32) -> Result<Self, ZeroPeriodError> {
        let nz = |value: u32, name: &'static str| NonZeroU32::new(value).ok_or(ZeroPeriodError { name });
        Ok(Self {
            fast: nz(fast, "fast")?,
            slow: nz(slow, "slow")?,
            signal: nz(signal, "signal")?,
        })
    }

    /// Number of points below which early MACD/signal values are numerically
    /// valid but have not yet forgotten their seed.
    pub fn warmup_len(&self) -> usize {
        (self.slow.get() as usize).saturating_add(self.signal.get() as usize)
    }
}
