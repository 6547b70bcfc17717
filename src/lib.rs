//! # macdvwap
//!
//! Single-instrument MACD/VWAP trader that wakes on interval boundaries,
//! opens one simulated leveraged position at a time and books the result
//! against a simulated balance.
//!
//! ```text
//!  Clock Aligner ─▶ Sampler ─┬─ MarketDataGateway (Binance klines)
//!                            └─ IndicatorGateway  (TAAPI.IO bulk)
//!       │
//!       ▼
//!  Signal Evaluator ─▶ Position State Machine ─▶ Equity Ledger ─▶ status line
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod models;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;
