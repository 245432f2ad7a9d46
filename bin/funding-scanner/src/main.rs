use anyhow::{Context, Result};
use clap::Parser;
use common::types::Exchange;
use config::ScannerConfig;
use detector::{DashboardApi, RefreshResponse, ScannerService, Scheduler, ViewParams};
use exchange_adapter_trait::ExchangeAdapters;
use exchange_adapters::{build_adapter, build_client};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments for funding-scanner.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the scanner configuration YAML
    #[arg(long, default_value = "config/default.yml")]
    config: String,
    /// Run a single refresh, print it as JSON and exit
    #[arg(long)]
    once: bool,
    /// Round-trip trading cost in basis points
    #[arg(long)]
    cost_bps: Option<u32>,
    /// Venues to show, comma separated (e.g. binance,bybit,hyperliquid)
    #[arg(long, value_delimiter = ',')]
    exchanges: Option<Vec<Exchange>>,
}

fn load_config(path: &str) -> Result<ScannerConfig> {
    if !Path::new(path).exists() {
        warn!(path, "Config file not found, using built-in defaults");
        return Ok(ScannerConfig::default());
    }
    ScannerConfig::load(path).with_context(|| format!("Failed to load config {}", path))
}

fn view_params(cfg: &ScannerConfig, args: &Args) -> Result<ViewParams> {
    let mut params = cfg.to_view_params();
    if let Some(cost) = args.cost_bps {
        params.spread_cost_bps = cost;
    }
    if let Some(exchanges) = &args.exchanges {
        params.exchanges = exchanges.iter().copied().collect();
    }
    params.validate()?;
    Ok(params)
}

fn build_registry(cfg: &ScannerConfig) -> Result<ExchangeAdapters> {
    let client = build_client(cfg.adapter_timeout())?;
    Ok(cfg
        .enabled_exchanges()
        .map(|e| build_adapter(e.name, client.clone(), e.base_url.as_deref()))
        .collect())
}

fn log_summary(response: &RefreshResponse) {
    let stats = &response.stats;
    info!(
        symbols = response.funding_rates.len(),
        opportunities = stats.total_opportunities,
        rate_arbitrage = stats.rate_arbitrage_count,
        interval_mismatch = stats.interval_mismatch_count,
        in_entry_window = stats.in_entry_window_count,
        profitable = stats.profitable_count,
        "Refresh complete"
    );
    if let Some(best) = &stats.best_opportunity {
        info!(
            symbol = %best.symbol,
            pair = %best.exchange_pair,
            short = %best.short_exchange,
            long = %best.long_exchange,
            spread_bps = best.rate_spread_bps,
            net_bps = best.net_profit_bps.unwrap_or(best.rate_spread_bps),
            annualized_pct = best.annualized_return_pct,
            "Best opportunity"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let cfg = load_config(&args.config)?;
    let params = view_params(&cfg, &args)?;
    let service = ScannerService::new(cfg.detector.clone(), build_registry(&cfg)?);
    info!(
        venues = ?service.exchanges(),
        interval_secs = cfg.refresh_interval_secs,
        "Starting funding scanner"
    );

    if args.once {
        let response = service.refresh(&params).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let (scheduler, handle, mut results) =
        Scheduler::new(service, params, cfg.refresh_interval());
    let scheduler_handle = scheduler.spawn();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            outcome = results.recv() => match outcome {
                Some(Ok(response)) => log_summary(&response),
                Some(Err(e)) => error!(error = %format!("{:#}", e), "Refresh cycle failed"),
                None => break,
            },
        }
    }

    // Graceful shutdown
    handle.shutdown().await.ok();
    drop(results);
    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Scheduler task panicked");
    }

    Ok(())
}
