//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching time-series bar data from any market data vendor.
//!
//! Each concrete provider implementation (such as Alpaca or a CSV directory) implements
//! [`DataProvider`] to handle vendor-specific API logic and validation.
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers; see [`build_provider`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar_series::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod csv_file;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};
use tracing::{debug, info};

use crate::models::{
    bar_series::BarSeries,
    request_params::{BarsRequestParams, ProviderParams},
};

/// Trait for fetching time-series bar data from a market data provider.
///
/// Implement this trait for each concrete data vendor.
#[async_trait]
pub trait DataProvider {
    /// Fetches time-series bar data for the given request parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters specifying symbols, timeframe, and date range.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<BarSeries>)` - A vector of bar series, one per symbol that had data.
    /// * `Err(ProviderError)` - If the request fails.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

#[async_trait]
impl<P> DataProvider for Box<P>
where
    P: DataProvider + Send + Sync + ?Sized,
{
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        (**self).fetch_bars(params).await
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// The CSV data directory does not exist.
    #[snafu(display("CSV data directory not found: {}", path.display()))]
    MissingDataDir { path: PathBuf, backtrace: Backtrace },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a non-success status (e.g., invalid API key).
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    /// The provider answered, but with zero bars for the symbol and range.
    #[snafu(display("No data available for ticker {symbol}"))]
    NoData { symbol: String, backtrace: Backtrace },

    /// A CSV source could not be parsed.
    #[snafu(display("Failed to read CSV {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A file-backed source could not be read.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// Whether retrying the same request may succeed: timeouts, connection
    /// failures, HTTP 429 and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Reqwest { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source
                        .status()
                        .is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ProviderInitError> for ProviderError {
    fn from(source: ProviderInitError) -> Self {
        ProviderError::Init { source }
    }
}

/// Which upstream to use (serde snake_case).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Alpaca market data REST API.
    #[default]
    Alpaca,
    /// A directory of `<SYMBOL>.csv` files.
    Csv,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpaca" => Ok(ProviderKind::Alpaca),
            "csv" => Ok(ProviderKind::Csv),
            other => Err(format!("unknown provider '{other}', expected alpaca or csv")),
        }
    }
}

/// Settings needed to construct any of the built-in providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Directory holding `<SYMBOL>.csv` files, for [`ProviderKind::Csv`].
    pub csv_dir: Option<PathBuf>,
    /// Base URL override for [`ProviderKind::Alpaca`].
    pub alpaca_base_url: Option<String>,
}

/// Build and return a boxed data provider for the supplied settings.
pub fn build_provider(
    settings: &ProviderSettings,
) -> Result<Box<dyn DataProvider + Send + Sync>, ProviderInitError> {
    match settings.kind {
        ProviderKind::Alpaca => {
            let mut p = alpaca_rest::provider::AlpacaProvider::new()?;
            if let Some(url) = &settings.alpaca_base_url {
                p = p.with_base_url(url.clone());
            }
            Ok(Box::new(p))
        }
        ProviderKind::Csv => {
            let dir = settings.csv_dir.clone().unwrap_or_else(|| PathBuf::from("data"));
            let p = csv_file::CsvProvider::new(dir)?;
            Ok(Box::new(p))
        }
    }
}

/// Fetches one symbol's daily bars over `[start, end)` and returns them as a
/// normalized (ascending, one bar per date), non-empty series.
///
/// # Errors
///
/// * [`ProviderError::Validation`] when `start` is not before `end`.
/// * [`ProviderError::NoData`] when the provider has no bars for the range.
/// * Any error reported by the provider itself.
pub async fn fetch_daily_series<P>(
    provider: &P,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    provider_specific: ProviderParams,
) -> Result<BarSeries, ProviderError>
where
    P: DataProvider + Send + Sync + ?Sized,
{
    if start >= end {
        return ValidationSnafu {
            message: format!("start date {start} must be before end date {end}"),
        }
        .fail();
    }

    let params = BarsRequestParams::daily(symbol, start, end).with_provider_params(provider_specific);
    let all = provider.fetch_bars(params).await?;

    let mut series = all
        .into_iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| NoDataSnafu { symbol }.build())?;

    let dropped = series.normalize();
    if dropped > 0 {
        debug!("fetch_daily_series | dropped {dropped} duplicate bars for {symbol}");
    }
    info!(
        "fetched {} daily bars for {} ({:?}..={:?})",
        series.len(),
        series.symbol,
        series.first_date(),
        series.last_date()
    );
    Ok(series)
}
