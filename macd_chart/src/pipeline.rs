use chrono::NaiveDate;
use macd_engine::{
    MacdParams, MacdSeries, Marker, MarkerFilter, PRICE_MA_WINDOWS, PricePoint, Rescale, compute_macd, markers,
    sma_series,
};
use market_data_ingestor::{
    models::{bar_series::BarSeries, request_params::ProviderParams},
    providers::{DataProvider, ProviderError, fetch_daily_series},
    ticker::sanitize_ticker,
};
use tracing::{info, warn};

use crate::ChartError;

/// Everything needed to produce one chart.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    /// Raw user input; sanitized before use.
    pub ticker: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
    pub params: MacdParams,
    pub scale: Rescale,
    pub filter: MarkerFilter,
    pub provider_params: ProviderParams,
}

/// A simple moving average of the close, `None` until the window fills.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// The computed result handed to chart sinks. All per-bar vectors are aligned
/// with `bars.bars`.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub ticker: String,
    pub bars: BarSeries,
    pub params: MacdParams,
    pub scale: Rescale,
    /// MACD on the chosen scale.
    pub macd: MacdSeries,
    pub markers: Vec<Marker>,
    pub moving_averages: Vec<MovingAverage>,
}

impl Analysis {
    /// Close price of the bar a marker sits on.
    pub fn close_at(&self, marker: &Marker) -> Option<f64> {
        self.bars.bars.get(marker.index).map(|b| b.close)
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.markers.iter().any(|m| m.index == index)
    }
}

/// Fetches daily bars for the request and runs the MACD analysis on them.
///
/// # Errors
///
/// * [`ChartError::InvalidInput`] for a ticker that sanitizes to nothing or an
///   empty date range.
/// * [`ChartError::NoData`] when the provider has no bars.
/// * [`ChartError::Provider`] for any other provider failure.
pub async fn run_analysis<P>(provider: &P, request: ChartRequest) -> Result<Analysis, ChartError>
where
    P: DataProvider + Send + Sync + ?Sized,
{
    let ticker = sanitize_ticker(&request.ticker);
    if ticker.is_empty() {
        return Err(ChartError::InvalidInput(format!("'{}' is not a valid ticker", request.ticker)));
    }
    if request.start >= request.end {
        return Err(ChartError::InvalidInput(format!(
            "start date {} must be before end date {}",
            request.start, request.end
        )));
    }

    let bars = match fetch_daily_series(provider, &ticker, request.start, request.end, request.provider_params).await {
        Ok(bars) => bars,
        Err(ProviderError::NoData { .. }) => return Err(ChartError::NoData { ticker }),
        Err(e) => return Err(e.into()),
    };

    if bars.len() < request.params.warmup_len() {
        warn!(
            "{ticker}: only {} bars, fewer than the {}-bar warm-up; early MACD values are unreliable",
            bars.len(),
            request.params.warmup_len()
        );
    }

    let points: Vec<PricePoint> = bars.closes().map(PricePoint::from).collect();
    let raw = compute_macd(&points, &request.params)?;
    let macd = request.scale.apply(&raw);
    let marked = markers(&macd, &request.filter);

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let moving_averages = PRICE_MA_WINDOWS
        .iter()
        .map(|&window| MovingAverage {
            window,
            values: sma_series(&closes, window),
        })
        .collect();

    info!(
        "{ticker}: {} bars, {} crossovers, {} marked ({})",
        bars.len(),
        macd.crossovers().iter().filter(|c| c.is_event()).count(),
        marked.len(),
        request.scale.describe()
    );

    Ok(Analysis {
        ticker,
        bars,
        params: request.params,
        scale: request.scale,
        macd,
        markers: marked,
        moving_averages,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use macd_engine::Crossover;
    use market_data_ingestor::models::{bar::Bar, request_params::BarsRequestParams, timeframe::TimeFrame};

    use super::*;

    /// Serves the given closes on consecutive days from 2024-01-02.
    struct Closes(Vec<f64>);

    #[async_trait]
    impl DataProvider for Closes {
        async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
            let first = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();
            let bars = self
                .0
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar {
                    timestamp: first + Duration::days(i as i64),
                    open: c,
                    high: c + 1.0,
                    low: c - 1.0,
                    close: c,
                    volume: 1000.0,
                    trade_count: None,
                    vwap: None,
                })
                .collect();
            Ok(vec![BarSeries::new(params.symbols[0].clone(), TimeFrame::day(), bars)])
        }
    }

    fn request(ticker: &str, filter: MarkerFilter) -> ChartRequest {
        ChartRequest {
            ticker: ticker.to_string(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            params: MacdParams::new(3, 6, 3).unwrap(),
            scale: Rescale::Original,
            filter,
            provider_params: ProviderParams::None,
        }
    }

    fn zigzag() -> Vec<f64> {
        // falls, rises, falls: at least one crossover each way
        let mut v: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        v.extend((0..10).map(|i| 91.0 + 2.0 * i as f64));
        v.extend((0..10).map(|i| 109.0 - 2.0 * i as f64));
        v
    }

    #[tokio::test]
    async fn analysis_is_aligned_with_bars() {
        let provider = Closes(zigzag());
        let a = run_analysis(&provider, request(" aapl ", MarkerFilter::unfiltered()))
            .await
            .unwrap();

        assert_eq!(a.ticker, "AAPL");
        assert_eq!(a.macd.len(), a.bars.len());
        assert_eq!(a.moving_averages.len(), PRICE_MA_WINDOWS.len());
        assert!(a.moving_averages.iter().all(|ma| ma.values.len() == a.bars.len()));
        assert_eq!(a.moving_averages[0].values[11], Some(zigzag()[..12].iter().sum::<f64>() / 12.0));
        assert!(a.moving_averages[3].values.iter().all(Option::is_none));

        let events = a.macd.crossovers().iter().filter(|c| c.is_event()).count();
        assert_eq!(a.markers.len(), events);
        assert!(a.markers.iter().any(|m| m.kind == Crossover::Bullish));
        assert!(a.markers.iter().any(|m| m.kind == Crossover::Bearish));
        for m in &a.markers {
            assert!(a.is_marked(m.index));
            assert_eq!(a.close_at(m), Some(a.bars.bars[m.index].close));
        }
    }

    #[tokio::test]
    async fn filter_only_hides_markers() {
        let provider = Closes(zigzag());
        let all = run_analysis(&provider, request("AAPL", MarkerFilter::unfiltered()))
            .await
            .unwrap();
        let none = run_analysis(&provider, request("AAPL", MarkerFilter::new(f64::NEG_INFINITY, f64::INFINITY)))
            .await
            .unwrap();
        assert!(none.markers.is_empty());
        assert_eq!(all.macd, none.macd);
    }

    #[tokio::test]
    async fn bad_input_is_rejected_early() {
        let provider = Closes(vec![1.0]);
        let err = run_analysis(&provider, request("$$$", MarkerFilter::unfiltered()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidInput(_)));

        let mut req = request("AAPL", MarkerFilter::unfiltered());
        req.end = req.start;
        let err = run_analysis(&provider, req).await.unwrap_err();
        assert!(matches!(err, ChartError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_provider_result_is_no_data() {
        let provider = Closes(vec![]);
        let err = run_analysis(&provider, request("AAPL", MarkerFilter::unfiltered()))
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::NoData { ref ticker } if ticker == "AAPL"));
        assert_eq!(err.to_string(), "No data available for the given ticker.");
    }

    #[tokio::test]
    async fn percentile_scale_is_bounded() {
        let provider = Closes(zigzag());
        let mut req = request("AAPL", MarkerFilter::unfiltered());
        req.scale = Rescale::Percentile;
        let a = run_analysis(&provider, req).await.unwrap();
        assert!(a.macd.macd_line().iter().all(|v| (-100.0..=100.0).contains(v)));
        assert_eq!(a.scale, Rescale::Percentile);
    }
}
