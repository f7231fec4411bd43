use thiserror::Error;

/// Errors raised by the MACD computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacdError {
    /// The price sequence was empty, so there is nothing to seed the EMAs with.
    #[error("insufficient data: at least one price point is required")]
    InsufficientData,
}

/// A smoothing period of zero was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name} period must be a positive integer")]
pub struct ZeroPeriodError {
    pub name: &'static str,
}
