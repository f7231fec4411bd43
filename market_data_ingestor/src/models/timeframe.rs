use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// Bar interval: `amount` × `unit`.
///
/// Construction does not validate the amount; each provider checks the
/// combinations its API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    /// One trading day, the only interval the chart front end requests.
    pub fn day() -> Self {
        Self::new(1, TimeFrameUnit::Day)
    }

    /// Parses `"<amount><unit>"` shorthand such as `5m`, `1h`, `1d`, `1w`, `3mo`.
    pub fn parse(s: &str) -> Result<Self, TimeFrameError> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(|| TimeFrameError::InvalidInput {
            message: format!("missing unit in timeframe '{s}'"),
        })?;
        let (digits, unit) = s.split_at(split);
        let amount: u32 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| TimeFrameError::InvalidInput {
                message: format!("invalid amount in timeframe '{s}'"),
            })?
        };
        let unit = match unit.to_lowercase().as_str() {
            "m" | "min" | "minute" => TimeFrameUnit::Minute,
            "h" | "hr" | "hour" => TimeFrameUnit::Hour,
            "d" | "day" => TimeFrameUnit::Day,
            "w" | "wk" | "week" => TimeFrameUnit::Week,
            "mo" | "month" => TimeFrameUnit::Month,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("Invalid timeframe unit: {other}"),
                });
            }
        };
        Ok(Self::new(amount, unit))
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "d",
            TimeFrameUnit::Week => "w",
            TimeFrameUnit::Month => "mo",
        };
        write!(f, "{}{}", self.amount, unit)
    }
}
