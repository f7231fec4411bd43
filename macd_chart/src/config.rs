//! Layered settings: built-in defaults, then an optional TOML file, then
//! command-line flags (applied in [`crate::cli`]).
//!
//! ```toml
//! provider = "alpaca"
//! csv_dir = "data"
//! output_dir = "/tmp/macd_chart"
//!
//! [macd]
//! fast = 12
//! slow = 26
//! signal = 9
//!
//! [markers]
//! bullish_below = -10.0
//! bearish_above = 10.0
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 1000
//!
//! [alpaca]
//! feed = "iex"
//! adjustment = "all"
//! ```

use std::path::{Path, PathBuf};

use macd_engine::MarkerFilter;
use market_data_ingestor::{
    providers::{
        ProviderKind, ProviderSettings,
        alpaca_rest::params::{Adjustment, AlpacaBarsParams},
    },
    retry::RetryPolicy,
};
use serde::{Deserialize, Serialize};
use shared_utils::{
    config::{ConfigError, load_toml_path},
    env::get_env_var_opt,
};
use tracing::debug;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "MACD_CHART_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub provider: ProviderKind,
    /// Directory of `<SYMBOL>.csv` files for the CSV provider.
    pub csv_dir: PathBuf,
    /// Where charts and exports land when `--out` is not given.
    pub output_dir: PathBuf,
    /// Overrides the Alpaca data host.
    pub alpaca_base_url: Option<String>,
    pub macd: MacdConfig,
    pub markers: MarkersConfig,
    pub retry: RetryConfig,
    pub alpaca: AlpacaBarsParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            csv_dir: PathBuf::from("data"),
            output_dir: std::env::temp_dir().join("macd_chart"),
            alpaca_base_url: None,
            macd: MacdConfig::default(),
            markers: MarkersConfig::default(),
            retry: RetryConfig::default(),
            alpaca: AlpacaBarsParams {
                adjustment: Some(Adjustment::All),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacdConfig {
    pub fast: u32,
    pub slow: u32,
    pub signal: u32,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkersConfig {
    pub bullish_below: Option<f64>,
    pub bearish_above: Option<f64>,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            bullish_below: Some(-10.0),
            bearish_above: Some(10.0),
        }
    }
}

impl From<MarkersConfig> for MarkerFilter {
    fn from(m: MarkersConfig) -> Self {
        MarkerFilter {
            bullish_below: m.bullish_below,
            bearish_above: m.bearish_above,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(r: RetryConfig) -> Self {
        RetryPolicy::new(r.max_retries, r.base_delay_ms)
    }
}

impl AppConfig {
    /// Loads `path` if given, else the file named by `MACD_CHART_CONFIG`,
    /// else returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| get_env_var_opt(CONFIG_ENV_VAR).map(PathBuf::from));
        match path {
            Some(p) => {
                debug!("config | loading {}", p.display());
                load_toml_path(&p)
            }
            None => Ok(Self::default()),
        }
    }

    /// Alpaca request options. Bars are split and dividend adjusted unless the
    /// file asks for another `adjustment`, since raw bars put a cliff at
    /// every split.
    pub fn alpaca_params(&self) -> AlpacaBarsParams {
        let mut params = self.alpaca.clone();
        params.adjustment.get_or_insert(Adjustment::All);
        params
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            kind: self.provider,
            csv_dir: Some(self.csv_dir.clone()),
            alpaca_base_url: self.alpaca_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use market_data_ingestor::providers::alpaca_rest::params::Feed;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(body: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn full_file_round_trips_into_typed_settings() {
        let f = write_config(
            r#"
provider = "csv"
csv_dir = "fixtures"
output_dir = "/tmp/charts"

[macd]
fast = 5
slow = 35
signal = 5

[markers]
bullish_below = -1.5
bearish_above = 1.5

[retry]
max_retries = 1
base_delay_ms = 10

[alpaca]
feed = "iex"
adjustment = "all"
"#,
        );
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Csv);
        assert_eq!(cfg.csv_dir, PathBuf::from("fixtures"));
        assert_eq!(cfg.macd, MacdConfig { fast: 5, slow: 35, signal: 5 });
        assert_eq!(MarkerFilter::from(cfg.markers), MarkerFilter::new(-1.5, 1.5));
        assert_eq!(RetryPolicy::from(cfg.retry), RetryPolicy::new(1, 10));
        assert_eq!(cfg.alpaca.feed, Some(Feed::Iex));
        assert_eq!(cfg.alpaca.adjustment, Some(Adjustment::All));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let f = write_config("[macd]\nsignal = 4\n");
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.macd, MacdConfig { fast: 12, slow: 26, signal: 4 });
        assert_eq!(cfg.markers, MarkersConfig::default());
        assert_eq!(cfg.provider, ProviderKind::Alpaca);
    }

    #[test]
    fn alpaca_bars_are_adjusted_unless_configured() {
        assert_eq!(AppConfig::default().alpaca_params().adjustment, Some(Adjustment::All));

        // an [alpaca] section without `adjustment` still gets adjusted bars
        let f = write_config("[alpaca]\nfeed = \"iex\"\n");
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.alpaca_params().adjustment, Some(Adjustment::All));
        assert_eq!(cfg.alpaca_params().feed, Some(Feed::Iex));

        let f = write_config("[alpaca]\nadjustment = \"raw\"\n");
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.alpaca_params().adjustment, Some(Adjustment::Raw));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let f = write_config("[macd]\nfats = 4\n");
        assert!(matches!(AppConfig::load(Some(f.path())), Err(ConfigError::Parse { .. })));
    }

    #[test]
    #[serial]
    fn env_var_names_the_file() {
        let f = write_config("provider = \"csv\"\n");
        unsafe { std::env::set_var(CONFIG_ENV_VAR, f.path()) };
        let cfg = AppConfig::load(None);
        unsafe { std::env::remove_var(CONFIG_ENV_VAR) };
        assert_eq!(cfg.unwrap().provider, ProviderKind::Csv);
    }

    #[test]
    #[serial]
    fn no_file_means_defaults() {
        unsafe { std::env::remove_var(CONFIG_ENV_VAR) };
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }
}
