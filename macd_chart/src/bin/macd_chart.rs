use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use macd_chart::{
    cli::{Cli, Command},
    config::AppConfig,
    run_analysis,
    sink::{ChartSink, CsvSink, PlotlyHtmlSink, output_path},
};
use market_data_ingestor::{
    models::bar::EXCHANGE_TZ,
    providers::build_provider,
    retry::{RetryPolicy, RetryingProvider},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "macd_chart=info,market_data_ingestor=info";

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in .env; a missing file is fine
    let dotenv = dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(std::io::stderr)
        .init();
    if let Some(path) = dotenv {
        debug!("loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let mut cfg = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let args = cli.command.selection();
    args.apply_to(&mut cfg);

    let today = Utc::now().with_timezone(&EXCHANGE_TZ).date_naive();
    let request = args.to_request(&cfg, today)?;

    let provider = build_provider(&cfg.provider_settings()).context("setting up the data provider")?;
    let provider = RetryingProvider::new(provider, RetryPolicy::from(cfg.retry));

    let analysis = run_analysis(&provider, request).await?;

    let out = match &args.out {
        Some(path) => path.clone(),
        None => output_path(&cfg.output_dir, &analysis.ticker, cli.command.extension()),
    };
    let written = match &cli.command {
        Command::Chart(_) => PlotlyHtmlSink::new(out).write(&analysis)?,
        Command::Export(_) => CsvSink::new(out).write(&analysis)?,
    };

    println!("{}", written.display());
    Ok(())
}
