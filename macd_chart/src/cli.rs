use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use macd_engine::{MacdParams, MarkerFilter, Rescale};
use market_data_ingestor::{models::request_params::ProviderParams, providers::ProviderKind};

use crate::{ChartError, ChartRequest, config::AppConfig};

#[derive(Parser, Debug)]
#[command(name = "macd-chart", version, about = "MACD crossover charts for daily stock prices")]
pub struct Cli {
    /// TOML config file (falls back to $MACD_CHART_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write an interactive HTML chart
    Chart(SelectionArgs),
    /// Write the bars and MACD values as CSV
    Export(SelectionArgs),
}

impl Command {
    pub fn selection(&self) -> &SelectionArgs {
        match self {
            Command::Chart(args) | Command::Export(args) => args,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Command::Chart(_) => "html",
            Command::Export(_) => "csv",
        }
    }
}

/// First day of the default window.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Stock ticker, e.g. AAPL
    #[arg(long, short)]
    pub ticker: String,

    /// First date, YYYY-MM-DD [default: 2020-01-01]
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Day after the last date, YYYY-MM-DD [default: today]
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[arg(long)]
    pub fast: Option<u32>,

    #[arg(long)]
    pub slow: Option<u32>,

    #[arg(long)]
    pub signal: Option<u32>,

    /// original, normalization or percentile
    #[arg(long, default_value_t = Rescale::Original)]
    pub scale: Rescale,

    /// Mark bullish crossovers only while the signal line is below this
    #[arg(long, allow_negative_numbers = true)]
    pub bullish_below: Option<f64>,

    /// Mark bearish crossovers only while the signal line is above this
    #[arg(long, allow_negative_numbers = true)]
    pub bearish_above: Option<f64>,

    /// Mark every crossover
    #[arg(long, conflicts_with_all = ["bullish_below", "bearish_above"])]
    pub no_filter: bool,

    /// alpaca or csv
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Directory of <SYMBOL>.csv files for the csv provider
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,

    /// Output file [default: <output_dir>/<TICKER>_<timestamp>_<uuid>.<ext>]
    #[arg(long, short, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

impl SelectionArgs {
    /// Applies the provider flags on top of the file config.
    pub fn apply_to(&self, cfg: &mut AppConfig) {
        if let Some(kind) = self.provider {
            cfg.provider = kind;
        }
        if let Some(dir) = &self.csv_dir {
            cfg.csv_dir = dir.clone();
        }
    }

    /// Builds the analysis request, flags taking precedence over `cfg`.
    pub fn to_request(&self, cfg: &AppConfig, today: NaiveDate) -> Result<ChartRequest, ChartError> {
        let params = MacdParams::new(
            self.fast.unwrap_or(cfg.macd.fast),
            self.slow.unwrap_or(cfg.macd.slow),
            self.signal.unwrap_or(cfg.macd.signal),
        )
        .map_err(|e| ChartError::InvalidInput(e.to_string()))?;

        let mut filter = MarkerFilter::from(cfg.markers);
        if self.no_filter {
            filter = MarkerFilter::unfiltered();
        }
        if let Some(t) = self.bullish_below {
            filter.bullish_below = Some(t);
        }
        if let Some(t) = self.bearish_above {
            filter.bearish_above = Some(t);
        }

        let provider_params = match cfg.provider {
            ProviderKind::Alpaca => ProviderParams::Alpaca(cfg.alpaca_params()),
            ProviderKind::Csv => ProviderParams::None,
        };

        Ok(ChartRequest {
            ticker: self.ticker.clone(),
            start: self.start.unwrap_or_else(default_start),
            end: self.end.unwrap_or(today),
            params,
            scale: self.scale,
            filter,
            provider_params,
        })
    }
}
