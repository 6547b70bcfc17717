//! # gateway::binance
//!
//! Latest close from Binance's public kline endpoint.
//!
//! `GET /api/v3/klines?symbol=ETHUSDT&interval=5m&limit=2` answers with an
//! array of arrays; index 4 of each kline is the close, sent as a string:
//!
//! ```json
//! [[1700000000000, "2000.1", "2001.0", "1999.5", "2000.7", "12.3", ...]]
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::MarketDataError;
use crate::gateway::MarketDataGateway;
use crate::models::Interval;

const CLOSE_INDEX: usize = 4;

pub struct BinanceKlines {
    client:   reqwest::Client,
    base_url: String,
    api_key:  Option<String>,
    timeout:  Duration,
}

impl BinanceKlines {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl MarketDataGateway for BinanceKlines {
    async fn latest_close(&self, symbol: &str, interval: Interval) -> Result<f64, MarketDataError> {
        let url = format!("{}/api/v3/klines", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval.label()), ("limit", "2")])
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Binance unreachable");
            MarketDataError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Status { status: status.as_u16(), body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        let close = parse_latest_close(&body)?;
        debug!(symbol, interval = %interval, close, "Kline close fetched");
        Ok(close)
    }
}

/// Pull the close of the last kline out of a `/klines` response body.
pub fn parse_latest_close(body: &Value) -> Result<f64, MarketDataError> {
    let last = body
        .as_array()
        .and_then(|klines| klines.last())
        .ok_or_else(|| MarketDataError::Malformed("no klines returned".into()))?;

    let raw = last
        .get(CLOSE_INDEX)
        .ok_or_else(|| MarketDataError::Malformed("kline has no close field".into()))?;

    let close = match raw {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| MarketDataError::Malformed(format!("close is not numeric: {raw}")))?;

    if !close.is_finite() || close <= 0.0 {
        return Err(MarketDataError::Malformed(format!("close out of range: {close}")));
    }
    Ok(close)
}
