//! # gateway
//!
//! The two outside collaborators the trading loop depends on.
//!
//! | Trait                 | Live impl                | Provides                    |
//! |-----------------------|--------------------------|-----------------------------|
//! | [`MarketDataGateway`] | [`binance::BinanceKlines`] | latest candle close       |
//! | [`IndicatorGateway`]  | [`taapi::TaapiBulk`]       | MACD line/signal/hist, VWAP |
//!
//! Everything above this layer only sees the traits, so the engine runs the
//! same against a scripted fake in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{IndicatorError, MarketDataError};
use crate::models::{IndicatorValues, Interval};

pub mod binance;
pub mod taapi;

pub use binance::BinanceKlines;
pub use taapi::TaapiBulk;

#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Close price of the most recent candle for `symbol` at `interval`.
    async fn latest_close(&self, symbol: &str, interval: Interval) -> Result<f64, MarketDataError>;
}

#[async_trait]
pub trait IndicatorGateway: Send + Sync {
    /// Current MACD and VWAP values for `symbol` at `interval`.
    async fn indicators(&self, symbol: &str, interval: Interval)
        -> Result<IndicatorValues, IndicatorError>;
}

#[async_trait]
impl<T: MarketDataGateway + ?Sized> MarketDataGateway for Arc<T> {
    async fn latest_close(&self, symbol: &str, interval: Interval) -> Result<f64, MarketDataError> {
        (**self).latest_close(symbol, interval).await
    }
}

#[async_trait]
impl<T: IndicatorGateway + ?Sized> IndicatorGateway for Arc<T> {
    async fn indicators(&self, symbol: &str, interval: Interval)
        -> Result<IndicatorValues, IndicatorError>
    {
        (**self).indicators(symbol, interval).await
    }
}
