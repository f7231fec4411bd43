//! Alpaca market data v2 REST provider.
//!
//! Credentials are read from `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{Adjustment, AlpacaBarsParams, Feed, Sort};
pub use provider::AlpacaProvider;
