//! Price Series Provider for the MACD chart tool.
//!
//! Bars are fetched through the [`providers::DataProvider`] trait and come back
//! in the vendor-agnostic [`models::bar_series::BarSeries`] shape, sorted by
//! date. Two providers ship with the crate: Alpaca's REST market-data API and
//! a directory of CSV exports.

pub mod models;
pub mod providers;
pub mod retry;
pub mod ticker;
