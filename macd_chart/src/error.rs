use std::path::PathBuf;

use macd_engine::MacdError;
use market_data_ingestor::providers::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Engine(#[from] MacdError),

    /// The provider had no bars for the ticker and range.
    #[error("No data available for the given ticker.")]
    NoData { ticker: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("figure serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChartError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ChartError::Io { path, source }
    }
}
