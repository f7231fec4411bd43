//! Writers that turn an [`Analysis`] into a file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, Utc};
use macd_engine::{Crossover, Marker};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{Analysis, ChartError};

/// Something that renders an analysis. Implementations own their target.
pub trait ChartSink {
    type Output;

    fn write(&self, analysis: &Analysis) -> Result<Self::Output, ChartError>;
}

/// `<dir>/<TICKER>_<YYYYmmddHHMMSS>_<uuid>.<ext>`, unique per call.
pub fn output_path(dir: &Path, ticker: &str, ext: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    dir.join(format!("{ticker}_{stamp}_{}.{ext}", Uuid::new_v4()))
}

fn create_parent(path: &Path) -> Result<(), ChartError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(ChartError::io(parent))
        }
        _ => Ok(()),
    }
}

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const MA_COLORS: [&str; 4] = ["magenta", "cyan", "yellow", "black"];

/// Standalone HTML page with a two-row Plotly figure: candles, moving
/// averages and markers on top, the MACD and signal lines below.
#[derive(Debug, Clone)]
pub struct PlotlyHtmlSink {
    path: PathBuf,
}

impl PlotlyHtmlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn marker_trace(
    markers: &[(NaiveDate, f64)],
    kind: Crossover,
    size: u32,
    name: &str,
    axes: (&str, &str),
) -> Value {
    let (symbol, color) = match kind {
        Crossover::Bearish => ("triangle-down", "red"),
        _ => ("triangle-up", "green"),
    };
    let (x, y): (Vec<NaiveDate>, Vec<f64>) = markers.iter().copied().unzip();
    json!({
        "type": "scatter",
        "mode": "markers",
        "x": x,
        "y": y,
        "name": name,
        "marker": { "symbol": symbol, "color": color, "size": size },
        "xaxis": axes.0,
        "yaxis": axes.1,
    })
}

/// The Plotly `data` and `layout` objects for an analysis.
pub fn plotly_figure(analysis: &Analysis) -> Value {
    let dates: Vec<NaiveDate> = analysis.macd.dates().to_vec();
    let bars = &analysis.bars.bars;
    let top = ("x", "y");
    let bottom = ("x2", "y2");

    let mut traces = vec![json!({
        "type": "candlestick",
        "name": "Candlestick",
        "x": dates,
        "open": bars.iter().map(|b| b.open).collect::<Vec<_>>(),
        "high": bars.iter().map(|b| b.high).collect::<Vec<_>>(),
        "low": bars.iter().map(|b| b.low).collect::<Vec<_>>(),
        "close": bars.iter().map(|b| b.close).collect::<Vec<_>>(),
        "xaxis": top.0,
        "yaxis": top.1,
    })];

    for (ma, color) in analysis.moving_averages.iter().zip(MA_COLORS) {
        traces.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": format!("MA{} days MA", ma.window),
            "x": dates,
            "y": ma.values,
            "line": { "color": color, "width": 1.5 },
            "xaxis": top.0,
            "yaxis": top.1,
        }));
    }

    traces.push(json!({
        "type": "scatter",
        "mode": "lines",
        "name": "MACD",
        "x": dates,
        "y": analysis.macd.macd_line(),
        "line": { "color": "blue", "width": 2 },
        "xaxis": bottom.0,
        "yaxis": bottom.1,
    }));
    traces.push(json!({
        "type": "scatter",
        "mode": "lines",
        "name": "Signal Line",
        "x": dates,
        "y": analysis.macd.signal_line(),
        "line": { "color": "orange", "width": 2 },
        "xaxis": bottom.0,
        "yaxis": bottom.1,
    }));

    let pick = |kind: Crossover, value: &dyn Fn(&Marker) -> Option<f64>| -> Vec<(NaiveDate, f64)> {
        analysis
            .markers
            .iter()
            .filter(|m| m.kind == kind)
            .filter_map(|m| value(m).map(|v| (m.date, v)))
            .collect()
    };
    let on_macd = |m: &Marker| Some(m.macd);
    let on_close = |m: &Marker| analysis.close_at(m);

    traces.push(marker_trace(
        &pick(Crossover::Bullish, &on_macd),
        Crossover::Bullish,
        20,
        "Bullish Crossover (MACD)",
        bottom,
    ));
    traces.push(marker_trace(
        &pick(Crossover::Bearish, &on_macd),
        Crossover::Bearish,
        20,
        "Bearish Crossover (MACD)",
        bottom,
    ));
    traces.push(marker_trace(
        &pick(Crossover::Bullish, &on_close),
        Crossover::Bullish,
        25,
        "Bullish Crossover (Close)",
        top,
    ));
    traces.push(marker_trace(
        &pick(Crossover::Bearish, &on_close),
        Crossover::Bearish,
        25,
        "Bearish Crossover (Close)",
        top,
    ));

    let layout = json!({
        "title": { "text": format!("{} MACD {}/{}/{}, {}",
            analysis.ticker,
            analysis.params.fast,
            analysis.params.slow,
            analysis.params.signal,
            analysis.scale.describe()) },
        "height": 800,
        "showlegend": true,
        "xaxis": { "anchor": "y", "rangeslider": { "visible": false }, "showticklabels": false },
        "xaxis2": { "anchor": "y2", "matches": "x", "rangeslider": { "visible": false } },
        "yaxis": { "domain": [0.24, 1.0] },
        "yaxis2": { "domain": [0.0, 0.22] },
        "annotations": [
            { "text": format!("{} Candlestick", analysis.ticker), "showarrow": false,
              "xref": "paper", "yref": "paper", "x": 0.5, "y": 1.0, "yanchor": "bottom" },
            { "text": "MACD", "showarrow": false,
              "xref": "paper", "yref": "paper", "x": 0.5, "y": 0.22, "yanchor": "bottom" },
        ],
    });

    json!({ "data": traces, "layout": layout })
}

/// Full HTML document embedding the figure.
pub fn render_html(analysis: &Analysis) -> Result<String, ChartError> {
    // "</" inside a script block would end it early
    let figure = serde_json::to_string(&plotly_figure(analysis))?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{ticker} MACD</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:800px;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        ticker = analysis.ticker,
    ))
}

impl ChartSink for PlotlyHtmlSink {
    type Output = PathBuf;

    fn write(&self, analysis: &Analysis) -> Result<PathBuf, ChartError> {
        let html = render_html(analysis)?;
        create_parent(&self.path)?;
        fs::write(&self.path, html).map_err(ChartError::io(&self.path))?;
        info!("wrote chart for {} to {}", analysis.ticker, self.path.display());
        Ok(self.path.clone())
    }
}

#[derive(Debug, Serialize)]
struct ExportRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    macd: f64,
    signal: f64,
    crossover: i8,
    marker: bool,
}

/// One CSV row per bar with the MACD values on the chosen scale. The
/// `crossover` column holds 1, -1 or 0.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChartSink for CsvSink {
    type Output = PathBuf;

    fn write(&self, analysis: &Analysis) -> Result<PathBuf, ChartError> {
        create_parent(&self.path)?;
        let mut writer = csv::Writer::from_path(&self.path)?;
        for (i, (bar, point)) in analysis.bars.bars.iter().zip(analysis.macd.points()).enumerate() {
            writer.serialize(ExportRow {
                date: point.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                macd: point.macd,
                signal: point.signal,
                crossover: point.crossover.as_i8(),
                marker: analysis.is_marked(i),
            })?;
        }
        writer.flush().map_err(ChartError::io(&self.path))?;
        info!("exported {} rows for {} to {}", analysis.macd.len(), analysis.ticker, self.path.display());
        Ok(self.path.clone())
    }
}
