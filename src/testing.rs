//! Test doubles: a virtual clock and scripted gateways.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::clock::Clock;
use crate::error::{IndicatorError, MarketDataError};
use crate::gateway::{IndicatorGateway, MarketDataGateway};
use crate::models::{IndicatorValues, Interval};

/// `hh:mm:ss` on a fixed test day.
pub fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, second).unwrap()
}

pub fn bullish(vwap: f64) -> IndicatorValues {
    IndicatorValues { macd_line: 2.0, macd_signal: 1.0, macd_histogram: 1.0, vwap }
}

pub fn bearish(vwap: f64) -> IndicatorValues {
    IndicatorValues { macd_line: -2.0, macd_signal: -1.0, macd_histogram: -1.0, vwap }
}

/// Histogram at zero: neither entry pattern can hold.
pub fn neutral() -> IndicatorValues {
    IndicatorValues { macd_line: 0.0, macd_signal: 0.0, macd_histogram: 0.0, vwap: 1.0 }
}

// ─── ManualClock ──────────────────────────────────────────────────────────────

/// Sleeping advances virtual time instantly and records the duration.
pub struct ManualClock {
    now:    Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now), sleeps: Mutex::new(Vec::new()) }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
        }
        tokio::task::yield_now().await;
    }
}

// ─── Scripted gateways ────────────────────────────────────────────────────────

/// Plays back closes in order; `None` is a failed fetch.  Once the script
/// runs out the last entry repeats.
pub struct ScriptedMarket {
    script: Mutex<VecDeque<Option<f64>>>,
    last:   Mutex<Option<f64>>,
    calls:  AtomicUsize,
}

impl ScriptedMarket {
    pub fn new(script: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last:   Mutex::new(None),
            calls:  AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MarketDataGateway for ScriptedMarket {
    async fn latest_close(&self, _symbol: &str, _interval: Interval) -> Result<f64, MarketDataError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let next = match self.script.lock().unwrap().pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step;
                step
            }
            None => *self.last.lock().unwrap(),
        };
        next.ok_or_else(|| MarketDataError::Transport("scripted outage".into()))
    }
}

/// Same playback rules as [`ScriptedMarket`], for indicator values.
pub struct ScriptedIndicators {
    script: Mutex<VecDeque<Option<IndicatorValues>>>,
    last:   Mutex<Option<IndicatorValues>>,
    calls:  AtomicUsize,
}

impl ScriptedIndicators {
    pub fn new(script: impl IntoIterator<Item = Option<IndicatorValues>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            last:   Mutex::new(None),
            calls:  AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl IndicatorGateway for ScriptedIndicators {
    async fn indicators(&self, _symbol: &str, _interval: Interval)
        -> Result<IndicatorValues, IndicatorError>
    {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let next = match self.script.lock().unwrap().pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step;
                step
            }
            None => *self.last.lock().unwrap(),
        };
        next.ok_or(IndicatorError::MissingField("valueMACD"))
    }
}
