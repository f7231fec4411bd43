use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{
    Client,
    header::{self, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::{bar::Bar, bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, InvalidApiKeySnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, ReqwestSnafu, ValidationSnafu,
        alpaca_rest::{
            params::{construct_params, validate_timeframe},
            response::{AlpacaBar, AlpacaResponse},
        },
    },
};

const BASE_URL: &str = "https://data.alpaca.markets";
const BARS_PATH: &str = "/v2/stocks/bars";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    _api_key: SecretString,
    _secret_key: SecretString,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var("APCA_API_KEY_ID").context(MissingEnvVarSnafu)?.into());
        let secret_key =
            SecretString::new(get_env_var("APCA_API_SECRET_KEY").context(MissingEnvVarSnafu)?.into());
        Self::with_credentials(api_key, secret_key)
    }

    /// Creates a provider from explicit credentials.
    pub fn with_credentials(api_key: SecretString, secret_key: SecretString) -> Result<Self, ProviderInitError> {
        let mut key_header = HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?;
        key_header.set_sensitive(true);
        let mut secret_header = HeaderValue::from_str(secret_key.expose_secret()).context(InvalidApiKeySnafu)?;
        secret_header.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("apca-api-key-id", key_header);
        headers.insert("apca-api-secret-key", secret_header);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            // free-plan allowance for the market data API
            limiter: RateLimiter::direct(Quota::per_minute(nonzero!(200u32))),
            _api_key: api_key,
            _secret_key: secret_key,
        })
    }

    /// Points the provider at another host, e.g. a paper or mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn bars_url(&self) -> String {
        format!("{}{}", self.base_url, BARS_PATH)
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        validate_timeframe(&params.timeframe)?;
        if params.symbols.is_empty() {
            return ValidationSnafu {
                message: "at least one symbol is required",
            }
            .fail();
        }

        let url = self.bars_url();
        let mut all_bars: IndexMap<String, Vec<AlpacaBar>> = IndexMap::new();
        let mut next_page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query_params = construct_params(&params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            self.limiter.until_ready().await;
            let response = self
                .client
                .get(&url)
                .query(&query_params)
                .send()
                .await
                .context(ReqwestSnafu)?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                warn!("alpaca | {} returned {status}", BARS_PATH);
                return ApiSnafu {
                    status: status.as_u16(),
                    message,
                }
                .fail();
            }

            let page = response.json::<AlpacaResponse>().await.context(ReqwestSnafu)?;
            pages += 1;

            for (symbol, bars) in page.bars.unwrap_or_default() {
                all_bars.entry(symbol).or_default().extend(bars);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "alpaca | {} page(s), {} bar(s) for {:?}",
            pages,
            all_bars.values().map(Vec::len).sum::<usize>(),
            params.symbols
        );

        let result = all_bars
            .into_iter()
            .map(|(symbol, alpaca_bars)| {
                let bars: Vec<Bar> = alpaca_bars.into_iter().map(Bar::from).collect();
                BarSeries::new(symbol, params.timeframe, bars)
            })
            .collect();

        Ok(result)
    }
}
