//! MACD crossover charts for daily stock prices.
//!
//! The pipeline is: fetch bars through a
//! [`DataProvider`](market_data_ingestor::providers::DataProvider), compute
//! the MACD with [`macd_engine`], rescale, pick the crossovers worth marking,
//! then hand the resulting [`pipeline::Analysis`] to a [`sink::ChartSink`].

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sink;

pub use error::ChartError;
pub use pipeline::{Analysis, ChartRequest, run_analysis};
