//! # events
//!
//! Defines [`TradeEvent`]: everything the loop reports to the outside
//! world.  Each event renders two ways: a human line (`Display`), which is
//! the log message, and a JSON object (`to_json`), attached as a structured
//! field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Direction, ExitReason};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeEvent {
    /// Entry signal confirmed, simulated position opened at the close.
    PositionOpened {
        direction: Direction,
        price:     f64,
        at:        DateTime<Utc>,
    },

    /// Exit-wait found its exit; the ledger has been updated.
    PositionClosed {
        direction:   Direction,
        entry_price: f64,
        exit_price:  f64,
        reason:      ExitReason,
        balance:     f64,
        at:          DateTime<Utc>,
    },

    /// Indicator fetch failed; the round carries a stale reading and the
    /// trade counter has been docked one trade.
    IndicatorsStale {
        round:      u64,
        net_trades: i64,
        error:      String,
    },

    /// Once per outer-loop cycle.
    Status {
        total_trades: i64,
        profit_pct:   f64,
        balance:      f64,
    },
}

impl TradeEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::PositionOpened { direction: Direction::Long, price, .. } => {
                write!(f, "Long Position Taken at {price}")
            }
            TradeEvent::PositionOpened { direction: Direction::Short, price, .. } => {
                write!(f, "Short sell at {price}")
            }
            TradeEvent::PositionClosed { direction: Direction::Long, exit_price, reason, .. } => {
                write!(f, "Position Closed at {exit_price} ({reason})")
            }
            TradeEvent::PositionClosed { direction: Direction::Short, exit_price, reason, .. } => {
                write!(f, "Position Squared off at {exit_price} ({reason})")
            }
            TradeEvent::IndicatorsStale { round, net_trades, error } => write!(
                f,
                "Indicators unavailable in round {round} ({error}) | Total Trades: {net_trades}"
            ),
            TradeEvent::Status { total_trades, profit_pct, balance } => write!(
                f,
                "Total Trades: {total_trades} | Profit: {profit_pct:.2}% | Current Balance: {balance:.2}"
            ),
        }
    }
}
