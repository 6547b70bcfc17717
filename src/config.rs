//! # config — read Config from environment variables
//!
//! | Variable               | Default                   |
//! |------------------------|---------------------------|
//! | `BINANCE_API_KEY`      | unset (public klines)     |
//! | `BINANCE_URL`          | `https://api.binance.com` |
//! | `TAAPI_SECRET`         | **required**              |
//! | `TAAPI_URL`            | `https://api.taapi.io`    |
//! | `SYMBOL`               | `ETHUSDT`                 |
//! | `INDICATOR_SYMBOL`     | `ETH/USDT`                |
//! | `INTERVAL_MINUTES`     | `5`                       |
//! | `STARTING_BALANCE`     | `20000`                   |
//! | `LEVERAGE`             | `5`                       |
//! | `DAILY_TRADE_CAP`      | `5` (0 = no cap)          |
//! | `EXIT_BAND_PCT`        | `1.0`                     |
//! | `POLL_DELAY_SECS`      | `10`                      |
//! | `REQUEST_TIMEOUT_SECS` | `10`                      |
//! | `RETRY_BACKOFF_SECS`   | `30`                      |

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::engine::TradingSettings;
use crate::models::Interval;

#[derive(Debug, Clone)]
pub struct Config {
    pub binance_api_key:   Option<String>,
    pub binance_url:       String,
    pub taapi_secret:      String,
    pub taapi_url:         String,
    /// Exchange symbol, e.g. `"ETHUSDT"`
    pub symbol:            String,
    /// Same pair as the indicator provider spells it, e.g. `"ETH/USDT"`
    pub indicator_symbol:  String,
    pub interval:          Interval,
    pub starting_balance:  f64,
    pub leverage:          f64,
    pub daily_trade_cap:   u32,
    pub exit_band_pct:     f64,
    pub poll_delay:        Duration,
    pub request_timeout:   Duration,
    pub retry_backoff:     Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let taapi_secret = lookup("TAAPI_SECRET")
            .filter(|s| !s.trim().is_empty())
            .context("TAAPI_SECRET environment variable is required")?;

        let minutes: u32 = parse_or(&lookup, "INTERVAL_MINUTES", 5)?;
        let interval = Interval::from_minutes(minutes).with_context(|| {
            format!("INTERVAL_MINUTES={minutes} has no kline interval (use 1,3,5,15,30,60,120,240,360,480,720,1440)")
        })?;

        let starting_balance: f64 = parse_or(&lookup, "STARTING_BALANCE", 20000.0)?;
        if !(starting_balance.is_finite() && starting_balance > 0.0) {
            bail!("STARTING_BALANCE must be positive, got {starting_balance}");
        }

        let leverage: f64 = parse_or(&lookup, "LEVERAGE", 5.0)?;
        if !(leverage.is_finite() && leverage > 0.0) {
            bail!("LEVERAGE must be positive, got {leverage}");
        }

        let exit_band_pct: f64 = parse_or(&lookup, "EXIT_BAND_PCT", 1.0)?;
        if !(exit_band_pct.is_finite() && exit_band_pct > 0.0) {
            bail!("EXIT_BAND_PCT must be positive, got {exit_band_pct}");
        }

        Ok(Self {
            binance_api_key:   lookup("BINANCE_API_KEY").filter(|s| !s.is_empty()),
            binance_url:       lookup("BINANCE_URL").unwrap_or_else(|| "https://api.binance.com".to_string()),
            taapi_secret,
            taapi_url:         lookup("TAAPI_URL").unwrap_or_else(|| "https://api.taapi.io".to_string()),
            symbol:            lookup("SYMBOL").unwrap_or_else(|| "ETHUSDT".to_string()),
            indicator_symbol:  lookup("INDICATOR_SYMBOL").unwrap_or_else(|| "ETH/USDT".to_string()),
            interval,
            starting_balance,
            leverage,
            daily_trade_cap:   parse_or(&lookup, "DAILY_TRADE_CAP", 5)?,
            exit_band_pct,
            poll_delay:        Duration::from_secs(parse_or(&lookup, "POLL_DELAY_SECS", 10)?),
            request_timeout:   Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 10)?),
            retry_backoff:     Duration::from_secs(parse_or(&lookup, "RETRY_BACKOFF_SECS", 30)?),
        })
    }

    pub fn trading_settings(&self) -> TradingSettings {
        TradingSettings {
            starting_balance: self.starting_balance,
            leverage:          self.leverage,
            trade_cap:         self.daily_trade_cap,
            exit_band_pct:     self.exit_band_pct,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("TAAPI_SECRET", "abc")]).unwrap();
        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.indicator_symbol, "ETH/USDT");
        assert_eq!(config.interval, Interval::FIVE_MINUTES);
        assert_eq!(config.starting_balance, 20000.0);
        assert_eq!(config.leverage, 5.0);
        assert_eq!(config.daily_trade_cap, 5);
        assert_eq!(config.exit_band_pct, 1.0);
        assert_eq!(config.poll_delay, Duration::from_secs(10));
        assert!(config.binance_api_key.is_none());
    }

    #[test]
    fn test_secret_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("TAAPI_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TAAPI_SECRET", "abc"),
            ("SYMBOL", "BTCUSDT"),
            ("INTERVAL_MINUTES", "15"),
            ("DAILY_TRADE_CAP", "0"),
            ("LEVERAGE", "2.5"),
        ])
        .unwrap();
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.interval.label(), "15m");
        assert_eq!(config.trading_settings().trade_cap, 0);
        assert_eq!(config.trading_settings().leverage, 2.5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(load(&[("TAAPI_SECRET", "abc"), ("INTERVAL_MINUTES", "7")]).is_err());
        assert!(load(&[("TAAPI_SECRET", "abc"), ("LEVERAGE", "-1")]).is_err());
        assert!(load(&[("TAAPI_SECRET", "abc"), ("STARTING_BALANCE", "lots")]).is_err());
        assert!(load(&[("TAAPI_SECRET", "abc"), ("DAILY_TRADE_CAP", "-2")]).is_err());
    }
}
