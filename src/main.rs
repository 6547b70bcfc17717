//! # macdvwap — interval-aligned MACD/VWAP trader
//!
//! ## Flow
//! ```text
//! align to next interval mark
//! loop:
//!   1. Fetch latest close (Binance klines)
//!   2. Fetch MACD + VWAP (TAAPI.IO bulk)
//!   3. Entry pattern?  → open, wait for exit, book PnL
//!   4. Status line, 10s pause, realign
//! until the trade cap is reached or Ctrl-C
//! ```

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use macdvwap::clock::{Pacer, SystemClock};
use macdvwap::config::Config;
use macdvwap::engine::{Orchestrator, Sampler};
use macdvwap::gateway::{BinanceKlines, TaapiBulk};
use macdvwap::shutdown::ShutdownSignal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("macdvwap=debug".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════╗
  ║   MACDVWAP — Interval Trader              ║
  ║   simulated equity · one position         ║
  ╚═══════════════════════════════════════════╝"#);

    let config = Config::from_env().context("Failed to load config")?;
    let client = reqwest::Client::new();

    info!(
        symbol   = %config.symbol,
        interval = %config.interval,
        balance  = config.starting_balance,
        leverage = config.leverage,
        cap      = config.daily_trade_cap,
        "Trader configured"
    );

    let market = BinanceKlines::new(
        client.clone(),
        config.binance_url.clone(),
        config.binance_api_key.clone(),
        config.request_timeout,
    );
    let indicators = TaapiBulk::new(
        client,
        config.taapi_url.clone(),
        config.taapi_secret.clone(),
        config.indicator_symbol.clone(),
        config.request_timeout,
    );

    let (signal, shutdown) = ShutdownSignal::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received — stopping after the current wait");
            signal.trigger();
        }
    });

    let sampler = Sampler::new(market, indicators, config.symbol.clone(), config.interval);
    let pacer = Pacer::new(
        SystemClock,
        config.interval,
        shutdown,
        config.poll_delay,
        config.retry_backoff,
    );
    let mut orchestrator = Orchestrator::new(sampler, pacer, &config.trading_settings());

    let summary = orchestrator.run().await;
    info!(summary = %serde_json::to_string(&summary)?, "Bye");

    Ok(())
}
