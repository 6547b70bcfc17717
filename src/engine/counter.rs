//! # engine::counter
//!
//! Net trade count for the session.  A completed round trip adds one; every
//! failed indicator fetch takes one away, so a flaky provider buys the loop
//! extra room under the cap instead of stopping it early.

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TradeCounter {
    net:         i64,
    round_trips: u64,
    penalties:   u64,
}

impl TradeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net count: round trips minus indicator penalties. May go negative.
    pub fn value(&self) -> i64 {
        self.net
    }

    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    pub fn penalties(&self) -> u64 {
        self.penalties
    }

    pub fn record_round_trip(&mut self) {
        self.net += 1;
        self.round_trips += 1;
    }

    pub fn penalize(&mut self) {
        self.net -= 1;
        self.penalties += 1;
    }

    /// `true` once the net count reaches `cap`. A cap of 0 never trips.
    pub fn reached(&self, cap: u32) -> bool {
        let hit = cap > 0 && self.net >= i64::from(cap);
        if hit {
            info!(net = self.net, cap, "Daily trade cap reached");
        }
        hit
    }
}
