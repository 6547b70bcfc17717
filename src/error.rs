//! # error
//!
//! Centralised error types for the trading loop.
//!
//! Gateways return their own narrow error (`MarketDataError`,
//! `IndicatorError`) so the engine can apply a different recovery policy to
//! each.  [`TradeError`] is what a cycle of the orchestrator can fail with.

use thiserror::Error;

/// Failure fetching the latest close from the exchange.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Request never completed (DNS, TLS, timeout, connection reset).
    #[error("Exchange unreachable: {0}")]
    Transport(String),

    /// Exchange answered with a non-2xx status (bad key, rate limit ...).
    #[error("Exchange HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body arrived but did not contain a usable close price.
    #[error("Malformed kline response: {0}")]
    Malformed(String),
}

/// Failure fetching the MACD / VWAP snapshot from the indicator provider.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("Indicator provider unreachable: {0}")]
    Transport(String),

    #[error("Indicator provider HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A required field was absent or not numeric.
    #[error("Indicator response missing `{0}`")]
    MissingField(&'static str),
}

/// Rejected equity update.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Exit price must be positive, got {0}")]
    NonPositiveExit(f64),

    #[error("Entry price must be positive, got {0}")]
    NonPositiveEntry(f64),
}

/// Everything a single orchestrator cycle can end with, besides success.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Exit-wait was asked to run with nothing open.
    #[error("No open position")]
    NoOpenPosition,

    /// The shutdown signal fired while the loop was waiting.
    #[error("Shutdown requested")]
    Cancelled,
}
