//! # engine::sampler
//!
//! One sampling round packed into an immutable [`CycleContext`].
//!
//! ```text
//! sample           (entry):      close ─▶ indicators
//! sample_for_exit  (exit-wait):  indicators ─▶ close
//! ```
//!
//! ## Failure policy
//! * Market data failure → the round fails (`MarketDataError`), caller decides.
//! * Indicator failure   → the round still succeeds, but the reading is
//!   tagged `Stale`, the trade counter takes a one-trade penalty and an
//!   `IndicatorsStale` event is queued for the orchestrator.
//!
//! In exit-wait the indicators go first, so a round whose close fetch fails
//! has already paid any indicator penalty.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::engine::counter::TradeCounter;
use crate::error::MarketDataError;
use crate::events::TradeEvent;
use crate::gateway::{IndicatorGateway, MarketDataGateway};
use crate::models::{
    CycleContext, IndicatorReading, IndicatorSnapshot, Interval, MarketSnapshot,
};

pub struct Sampler<M, I> {
    market:     M,
    indicators: I,
    symbol:     String,
    interval:   Interval,
    /// Last snapshot that came back intact; only ever exposed as `Stale`.
    last_good:  Option<IndicatorSnapshot>,
    /// Sampling attempts so far, failed ones included.
    rounds:     u64,
    pending:    Vec<TradeEvent>,
}

impl<M, I> Sampler<M, I>
where
    M: MarketDataGateway,
    I: IndicatorGateway,
{
    pub fn new(market: M, indicators: I, symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            market,
            indicators,
            symbol: symbol.into(),
            interval,
            last_good: None,
            rounds: 0,
            pending: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Events raised while sampling, oldest first. Drains the queue.
    pub fn take_events(&mut self) -> Vec<TradeEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Entry round: latest close first, then indicators.
    pub async fn sample(
        &mut self,
        at: DateTime<Utc>,
        counter: &mut TradeCounter,
    ) -> Result<CycleContext, MarketDataError> {
        self.rounds += 1;
        let close_price = self.market.latest_close(&self.symbol, self.interval).await?;
        let indicators = self.fetch_indicators(at, counter).await;
        Ok(self.context(at, close_price, indicators))
    }

    /// Exit-wait round: indicators first, then the latest close.
    pub async fn sample_for_exit(
        &mut self,
        at: DateTime<Utc>,
        counter: &mut TradeCounter,
    ) -> Result<CycleContext, MarketDataError> {
        self.rounds += 1;
        let indicators = self.fetch_indicators(at, counter).await;
        let close_price = self.market.latest_close(&self.symbol, self.interval).await?;
        Ok(self.context(at, close_price, indicators))
    }

    async fn fetch_indicators(&mut self, at: DateTime<Utc>, counter: &mut TradeCounter) -> IndicatorReading {
        match self.indicators.indicators(&self.symbol, self.interval).await {
            Ok(values) => {
                let snapshot = IndicatorSnapshot::stamp(values, at);
                self.last_good = Some(snapshot);
                IndicatorReading::Fresh(snapshot)
            }
            Err(e) => {
                counter.penalize();
                warn!(
                    error      = %e,
                    round      = self.rounds,
                    net_trades = counter.value(),
                    "Indicator fetch failed; reading marked stale"
                );
                self.pending.push(TradeEvent::IndicatorsStale {
                    round:      self.rounds,
                    net_trades: counter.value(),
                    error:      e.to_string(),
                });
                IndicatorReading::Stale { last: self.last_good }
            }
        }
    }

    fn context(&self, at: DateTime<Utc>, close_price: f64, indicators: IndicatorReading) -> CycleContext {
        CycleContext {
            round:  self.rounds,
            market: MarketSnapshot { close_price, sampled_at: at },
            indicators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::testing::{at, bullish, ScriptedIndicators, ScriptedMarket};

    #[tokio::test]
    async fn test_fresh_round() {
        let mut sampler = Sampler::new(
            ScriptedMarket::new([Some(1000.0)]),
            ScriptedIndicators::new([Some(bullish(990.0))]),
            "ETHUSDT",
            Interval::FIVE_MINUTES,
        );
        let mut counter = TradeCounter::new();

        let ctx = sampler.sample(at(10, 5, 0), &mut counter).await.unwrap();
        assert_eq!(ctx.round, 1);
        assert_eq!(ctx.close(), 1000.0);
        assert!(!ctx.indicators.is_stale());
        assert_eq!(counter.value(), 0);
    }

    #[tokio::test]
    async fn test_indicator_failure_goes_stale_and_penalizes() {
        let mut sampler = Sampler::new(
            ScriptedMarket::new([Some(1000.0), Some(1001.0)]),
            ScriptedIndicators::new([Some(bullish(990.0)), None]),
            "ETHUSDT",
            Interval::FIVE_MINUTES,
        );
        let mut counter = TradeCounter::new();

        let first = sampler.sample(at(10, 5, 0), &mut counter).await.unwrap();
        let second = sampler.sample(at(10, 10, 0), &mut counter).await.unwrap();

        let IndicatorReading::Stale { last } = second.indicators else {
            panic!("expected stale reading");
        };
        assert_eq!(last.as_ref(), first.indicators.fresh());
        assert_eq!(counter.value(), -1);

        let events = sampler.take_events();
        assert!(matches!(
            events.as_slice(),
            [TradeEvent::IndicatorsStale { round: 2, net_trades: -1, .. }]
        ));
        assert!(sampler.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_market_failure_fails_round_without_penalty() {
        let mut sampler = Sampler::new(
            ScriptedMarket::new([None]),
            ScriptedIndicators::new([None]),
            "ETHUSDT",
            Interval::FIVE_MINUTES,
        );
        let mut counter = TradeCounter::new();

        assert!(sampler.sample(at(10, 5, 0), &mut counter).await.is_err());
        assert_eq!(counter.value(), 0);
        assert_eq!(sampler.rounds(), 1);
        assert!(sampler.take_events().is_empty());
    }

    #[tokio::test]
    async fn test_exit_round_fetches_indicators_before_close() {
        let market = Arc::new(ScriptedMarket::new([None, Some(1002.0)]));
        let indicators = Arc::new(ScriptedIndicators::new([None, Some(bullish(990.0))]));
        let mut sampler = Sampler::new(market.clone(), indicators.clone(), "ETHUSDT", Interval::FIVE_MINUTES);
        let mut counter = TradeCounter::new();

        // both fail: the indicator penalty is paid before the close fetch errors
        assert!(sampler.sample_for_exit(at(10, 5, 0), &mut counter).await.is_err());
        assert_eq!(indicators.calls(), 1);
        assert_eq!(counter.penalties(), 1);
        assert_eq!(sampler.take_events().len(), 1);

        let ctx = sampler.sample_for_exit(at(10, 10, 0), &mut counter).await.unwrap();
        assert_eq!(ctx.round, 2);
        assert_eq!(ctx.close(), 1002.0);
        assert!(!ctx.indicators.is_stale());
        assert_eq!(market.calls(), 2);
    }
}
