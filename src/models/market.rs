//! # models::market
//!
//! What one sampling round sees: the latest close from the exchange and the
//! indicator snapshot from the provider, bundled into a [`CycleContext`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Interval ─────────────────────────────────────────────────────────────────

/// Decision cadence in whole minutes.
///
/// Only lengths that both the exchange and the indicator provider accept as a
/// kline interval can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Interval(u32);

impl Interval {
    pub const FIVE_MINUTES: Interval = Interval(5);

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        label_for(minutes).map(|_| Self(minutes))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Kline label, e.g. `"5m"`, `"1h"`, `"1d"`.
    pub fn label(self) -> &'static str {
        // constructors only admit minutes with a label
        label_for(self.0).unwrap_or("5m")
    }
}

fn label_for(minutes: u32) -> Option<&'static str> {
    Some(match minutes {
        1 => "1m",
        3 => "3m",
        5 => "5m",
        15 => "15m",
        30 => "30m",
        60 => "1h",
        120 => "2h",
        240 => "4h",
        360 => "6h",
        480 => "8h",
        720 => "12h",
        1440 => "1d",
        _ => return None,
    })
}

impl TryFrom<u32> for Interval {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| format!("unsupported interval: {minutes} minutes"))
    }
}

impl From<Interval> for u32 {
    fn from(interval: Interval) -> u32 {
        interval.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Snapshots ────────────────────────────────────────────────────────────────

/// Latest closing price of the tracked instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub close_price: f64,
    pub sampled_at:  DateTime<Utc>,
}

/// Raw MACD triple plus session VWAP, as returned by the indicator provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub macd_line:      f64,
    pub macd_signal:    f64,
    pub macd_histogram: f64,
    pub vwap:           f64,
}

/// [`IndicatorValues`] stamped with the time they were fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub macd_line:      f64,
    pub macd_signal:    f64,
    pub macd_histogram: f64,
    pub vwap:           f64,
    pub fetched_at:     DateTime<Utc>,
}

impl IndicatorSnapshot {
    pub fn stamp(values: IndicatorValues, fetched_at: DateTime<Utc>) -> Self {
        Self {
            macd_line:      values.macd_line,
            macd_signal:    values.macd_signal,
            macd_histogram: values.macd_histogram,
            vwap:           values.vwap,
            fetched_at,
        }
    }
}

/// Indicator values for a round, tagged with whether they are trustworthy.
///
/// A failed fetch never silently reuses old numbers: the previous snapshot is
/// carried as `Stale` so it can still be logged, but no decision reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    Fresh(IndicatorSnapshot),
    Stale { last: Option<IndicatorSnapshot> },
}

impl IndicatorReading {
    /// The snapshot, only if it came from this round's fetch.
    pub fn fresh(&self) -> Option<&IndicatorSnapshot> {
        match self {
            IndicatorReading::Fresh(snapshot) => Some(snapshot),
            IndicatorReading::Stale { .. } => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, IndicatorReading::Stale { .. })
    }
}

// ─── CycleContext ─────────────────────────────────────────────────────────────

/// Everything sampled in one round. Built once, then only borrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleContext {
    /// Sampling round number, counted across the whole session.
    pub round:      u64,
    pub market:     MarketSnapshot,
    pub indicators: IndicatorReading,
}

impl CycleContext {
    #[inline]
    pub fn close(&self) -> f64 {
        self.market.close_price
    }
}
