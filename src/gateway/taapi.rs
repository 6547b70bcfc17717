//! # gateway::taapi
//!
//! MACD + VWAP from TAAPI.IO in a single `POST /bulk` call.
//!
//! The provider answers with one entry per requested indicator, in request
//! order:
//!
//! ```json
//! { "data": [
//!     { "id": "...macd...", "result": { "valueMACD": 1.2, "valueMACDSignal": 0.9, "valueMACDHist": 0.3 } },
//!     { "id": "...vwap...", "result": { "value": 2001.4 } }
//! ] }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::IndicatorError;
use crate::gateway::IndicatorGateway;
use crate::models::{IndicatorValues, Interval};

// ─── Request ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BulkRequest<'a> {
    secret:    &'a str,
    construct: Construct<'a>,
}

#[derive(Serialize)]
struct Construct<'a> {
    exchange:   &'a str,
    symbol:     &'a str,
    interval:   &'a str,
    indicators: Vec<IndicatorSpec<'a>>,
}

#[derive(Serialize)]
struct IndicatorSpec<'a> {
    indicator: &'a str,
    #[serde(rename = "anchorPeriod", skip_serializing_if = "Option::is_none")]
    anchor_period: Option<&'a str>,
}

// ─── Gateway ──────────────────────────────────────────────────────────────────

pub struct TaapiBulk {
    client:   reqwest::Client,
    base_url: String,
    secret:   String,
    exchange: String,
    /// Provider-side symbol, e.g. `"ETH/USDT"`; not the exchange's `ETHUSDT`.
    symbol:   String,
    timeout:  Duration,
}

impl TaapiBulk {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        secret: impl Into<String>,
        symbol: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret:   secret.into(),
            exchange: "binance".to_string(),
            symbol:   symbol.into(),
            timeout,
        }
    }
}

#[async_trait]
impl IndicatorGateway for TaapiBulk {
    /// `symbol` is the exchange symbol the loop trades; the provider is
    /// always queried with its own configured pair name.
    async fn indicators(&self, symbol: &str, interval: Interval)
        -> Result<IndicatorValues, IndicatorError>
    {
        let body = BulkRequest {
            secret:    &self.secret,
            construct: Construct {
                exchange:   &self.exchange,
                symbol:     &self.symbol,
                interval:   interval.label(),
                indicators: vec![
                    IndicatorSpec { indicator: "macd", anchor_period: None },
                    IndicatorSpec { indicator: "vwap", anchor_period: Some("session") },
                ],
            },
        };

        let response = self
            .client
            .post(format!("{}/bulk", self.base_url))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| IndicatorError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(IndicatorError::Status { status: status.as_u16(), body: text });
        }

        let info: Value = response
            .json()
            .await
            .map_err(|e| IndicatorError::Transport(format!("unreadable body: {e}")))?;

        let values = parse_bulk_response(&info)?;
        debug!(
            symbol,
            provider_symbol = %self.symbol,
            macd      = values.macd_line,
            signal    = values.macd_signal,
            histogram = values.macd_histogram,
            vwap      = values.vwap,
            "Indicators fetched"
        );
        Ok(values)
    }
}

// ─── Parsing ──────────────────────────────────────────────────────────────────

/// Extract MACD and VWAP from a bulk response. Any missing or non-numeric
/// field fails the whole snapshot.
pub fn parse_bulk_response(info: &Value) -> Result<IndicatorValues, IndicatorError> {
    let macd = &info["data"][0]["result"];
    let vwap = &info["data"][1]["result"];

    Ok(IndicatorValues {
        macd_line:      number(&macd["valueMACD"]).ok_or(IndicatorError::MissingField("valueMACD"))?,
        macd_signal:    number(&macd["valueMACDSignal"])
            .ok_or(IndicatorError::MissingField("valueMACDSignal"))?,
        macd_histogram: number(&macd["valueMACDHist"])
            .ok_or(IndicatorError::MissingField("valueMACDHist"))?,
        vwap:           number(&vwap["value"]).ok_or(IndicatorError::MissingField("value"))?,
    })
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
