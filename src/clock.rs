//! # clock
//!
//! Wall-clock access and the **Clock Aligner**.
//!
//! Decisions are only taken right after an interval boundary (10:00, 10:05,
//! 10:10 ... for a 5 minute interval).  The aligner never does one long
//! sleep: it sleeps to the top of the next minute and re-checks, so latency
//! spent in gateway calls corrects itself on the next pass.
//!
//! ```text
//! 10:03:45 ── sleep 15s ──▶ 10:04:00 (minute 4, no) ── sleep 60s ──▶ 10:05:00 ✓
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, info};

use crate::error::TradeError;
use crate::models::Interval;
use crate::shutdown::Shutdown;

/// A boundary is accepted while second-of-minute is below this.
pub const BOUNDARY_TOLERANCE_SECS: f64 = 10.0;

// ─── Clock ────────────────────────────────────────────────────────────────────

/// Source of "now" plus a way to wait.  Swapped for a virtual clock in tests.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Real time, backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Sleep unless shutdown is requested first.
pub async fn pause<C: Clock + ?Sized>(
    clock: &C,
    duration: Duration,
    shutdown: &mut Shutdown,
) -> Result<(), TradeError> {
    if shutdown.is_triggered() {
        return Err(TradeError::Cancelled);
    }
    tokio::select! {
        _ = clock.sleep(duration) => Ok(()),
        _ = shutdown.cancelled() => Err(TradeError::Cancelled),
    }
}

// ─── Boundary math ────────────────────────────────────────────────────────────

fn second_of_minute(now: DateTime<Utc>) -> f64 {
    now.second() as f64 + now.nanosecond() as f64 / 1e9
}

/// `true` when `now` sits inside the tolerance window of an interval mark.
///
/// Minutes are counted from midnight so intervals longer than an hour
/// (2h, 4h, 1d) line up the same way the exchange's klines do.
pub fn is_boundary(now: DateTime<Utc>, interval: Interval) -> bool {
    let minute_of_day = now.hour() * 60 + now.minute();
    minute_of_day % interval.minutes() == 0 && second_of_minute(now) < BOUNDARY_TOLERANCE_SECS
}

/// Time left until the top of the next minute, never less than a second.
pub fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let remaining = 60 - second_of_minute(now).round() as u64;
    Duration::from_secs(remaining.max(1))
}

// ─── ClockAligner ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ClockAligner {
    interval: Interval,
    started:  bool,
}

impl ClockAligner {
    pub fn new(interval: Interval) -> Self {
        Self { interval, started: false }
    }

    /// Whether the first boundary has been reached yet.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Suspend until the next interval boundary (or return at once if `now`
    /// already is one).
    pub async fn align<C: Clock + ?Sized>(
        &mut self,
        clock: &C,
        shutdown: &mut Shutdown,
    ) -> Result<DateTime<Utc>, TradeError> {
        loop {
            let now = clock.now();
            if is_boundary(now, self.interval) {
                if !self.started {
                    self.started = true;
                    info!(interval = %self.interval, at = %now, "Starting the trade....");
                }
                return Ok(now);
            }

            let wait = until_next_minute(now);
            debug!(?wait, at = %now, "Waiting for next minute");
            pause(clock, wait, shutdown).await?;
        }
    }
}

// ─── Pacer ────────────────────────────────────────────────────────────────────

/// Everything the loops need to wait correctly: clock, aligner, shutdown
/// listener and the fixed delays.
pub struct Pacer<C> {
    clock:         C,
    aligner:       ClockAligner,
    shutdown:      Shutdown,
    poll_delay:    Duration,
    retry_backoff: Duration,
}

impl<C: Clock> Pacer<C> {
    pub fn new(
        clock: C,
        interval: Interval,
        shutdown: Shutdown,
        poll_delay: Duration,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            clock,
            aligner: ClockAligner::new(interval),
            shutdown,
            poll_delay,
            retry_backoff,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn align(&mut self) -> Result<DateTime<Utc>, TradeError> {
        self.aligner.align(&self.clock, &mut self.shutdown).await
    }

    /// The short pause between polls.
    pub async fn poll_delay(&mut self) -> Result<(), TradeError> {
        pause(&self.clock, self.poll_delay, &mut self.shutdown).await
    }

    /// The longer pause after a market-data failure.
    pub async fn backoff(&mut self) -> Result<(), TradeError> {
        pause(&self.clock, self.retry_backoff, &mut self.shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownSignal;
    use crate::testing::{at, ManualClock};

    #[test]
    fn test_is_boundary_tolerance() {
        let five = Interval::FIVE_MINUTES;
        assert!(is_boundary(at(10, 5, 0), five));
        assert!(is_boundary(at(10, 5, 9), five));
        assert!(!is_boundary(at(10, 5, 10), five));
        assert!(!is_boundary(at(10, 4, 0), five));
        assert!(is_boundary(at(0, 0, 3), five));
    }

    #[test]
    fn test_hour_interval_counts_from_midnight() {
        let hourly = Interval::from_minutes(60).unwrap();
        assert!(is_boundary(at(13, 0, 2), hourly));
        assert!(!is_boundary(at(13, 30, 2), hourly));

        let four_hourly = Interval::from_minutes(240).unwrap();
        assert!(is_boundary(at(8, 0, 0), four_hourly));
        assert!(!is_boundary(at(9, 0, 0), four_hourly));
    }

    #[test]
    fn test_until_next_minute_never_zero() {
        assert_eq!(until_next_minute(at(10, 3, 45)), Duration::from_secs(15));
        assert_eq!(until_next_minute(at(10, 3, 0)), Duration::from_secs(60));
        let almost = at(10, 3, 59) + chrono::Duration::milliseconds(700);
        assert_eq!(until_next_minute(almost), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_align_from_mid_interval() {
        let clock = ManualClock::starting_at(at(10, 3, 45));
        let mut aligner = ClockAligner::new(Interval::FIVE_MINUTES);
        let mut shutdown = Shutdown::never();

        let reached = aligner.align(&clock, &mut shutdown).await.unwrap();

        assert!(reached >= at(10, 4, 50) && reached < at(10, 5, 10));
        assert_eq!(clock.now(), reached);
        assert!(aligner.has_started());
        // 15s to 10:04:00, then a full minute; never one large sleep
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(15), Duration::from_secs(60)]);
    }

    #[tokio::test]
    async fn test_align_on_boundary_returns_immediately() {
        let clock = ManualClock::starting_at(at(10, 10, 4));
        let mut aligner = ClockAligner::new(Interval::FIVE_MINUTES);

        let reached = aligner.align(&clock, &mut Shutdown::never()).await.unwrap();
        assert_eq!(reached, at(10, 10, 4));
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_align_cancelled() {
        let clock = ManualClock::starting_at(at(10, 3, 45));
        let mut aligner = ClockAligner::new(Interval::FIVE_MINUTES);
        let (signal, mut shutdown) = ShutdownSignal::new();
        signal.trigger();

        let result = aligner.align(&clock, &mut shutdown).await;
        assert!(matches!(result, Err(TradeError::Cancelled)));
        assert!(!aligner.has_started());
    }
}
