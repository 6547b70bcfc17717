//! # models::position
//!
//! Directional position state and the record left behind when one closes.
//!
//! `PositionState` = what is open right now (at most one).
//! `TradeRecord`   = history entry for every completed round trip, never
//! removed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Direction ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short. Multiplies a raw price delta into PnL sign.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("Long"),
            Direction::Short => f.write_str("Short"),
        }
    }
}

// ─── OpenPosition / PositionState ─────────────────────────────────────────────

/// A live simulated position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub direction:   Direction,
    pub entry_price: f64,
    pub opened_at:   DateTime<Utc>,
}

impl OpenPosition {
    /// Signed price move since entry, positive when the position is winning.
    pub fn unrealised_move(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.direction.sign()
    }
}

/// Flat, or exactly one open position. An entry price cannot exist while flat.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn open_position(&self) -> Option<&OpenPosition> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(position) => Some(position),
        }
    }
}

// ─── ExitReason ───────────────────────────────────────────────────────────────

/// Why the exit-wait loop let go of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Indicators flipped to the opposite entry pattern.
    Reversal,
    /// Price moved the full band in the position's favour.
    TakeProfit,
    /// Price moved the full band against the position.
    StopLoss,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Reversal => f.write_str("indicator reversal"),
            ExitReason::TakeProfit => f.write_str("take profit"),
            ExitReason::StopLoss => f.write_str("stop loss"),
        }
    }
}

// ─── TradeRecord ──────────────────────────────────────────────────────────────

/// One completed open+close round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trade_id:      Uuid,
    pub symbol:        String,
    pub direction:     Direction,
    pub entry_price:   f64,
    pub exit_price:    f64,
    pub opened_at:     DateTime<Utc>,
    pub closed_at:     DateTime<Utc>,
    pub exit_reason:   ExitReason,
    /// Simulated equity right after this trade was booked.
    pub balance_after: f64,
}

impl TradeRecord {
    pub fn new(
        symbol: &str,
        position: &OpenPosition,
        exit_price: f64,
        closed_at: DateTime<Utc>,
        exit_reason: ExitReason,
        balance_after: f64,
    ) -> Self {
        Self {
            trade_id:    Uuid::new_v4(),
            symbol:      symbol.to_string(),
            direction:   position.direction,
            entry_price: position.entry_price,
            exit_price,
            opened_at:   position.opened_at,
            closed_at,
            exit_reason,
            balance_after,
        }
    }
}
