//! # engine::orchestrator
//!
//! **Trade Orchestrator**: the outer loop.
//!
//! ```text
//! align ─▶ loop:
//!   trade cap reached? ── yes ─▶ stop
//!   sample (close, indicators)
//!   evaluate_entry ── None ─────────────────────────────┐
//!        │ Long/Short                                   │
//!   open ─▶ wait_for_exit ─▶ close ─▶ ledger ─▶ +1 trade│
//!   status line ◀───────────────────────────────────────┘
//!   poll delay ─▶ align
//! ```
//!
//! A market-data failure costs one cycle plus a backoff; it never ends the
//! session.  Only the trade cap or the shutdown signal does.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, Pacer};
use crate::engine::counter::TradeCounter;
use crate::engine::ledger::EquityLedger;
use crate::engine::position::PositionMachine;
use crate::engine::sampler::Sampler;
use crate::engine::signal::evaluate_entry;
use crate::error::TradeError;
use crate::events::TradeEvent;
use crate::gateway::{IndicatorGateway, MarketDataGateway};
use crate::models::TradeRecord;

/// How many recent events are kept for inspection.
const JOURNAL_SIZE: usize = 256;

// ─── Settings / Summary ───────────────────────────────────────────────────────

/// Plain values the trading core is built from.
#[derive(Debug, Clone)]
pub struct TradingSettings {
    pub starting_balance: f64,
    pub leverage:         f64,
    /// Stop once the net trade count reaches this (0 = run until shutdown).
    pub trade_cap:        u32,
    pub exit_band_pct:    f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    TradeCapReached,
    Shutdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub stop:             StopReason,
    pub total_trades:     i64,
    pub round_trips:      u64,
    pub penalties:        u64,
    pub starting_balance: f64,
    pub leverage:         f64,
    pub balance:          f64,
    pub profit_pct:       f64,
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────

pub struct Orchestrator<M, I, C> {
    sampler:   Sampler<M, I>,
    pacer:     Pacer<C>,
    machine:   PositionMachine,
    ledger:    EquityLedger,
    counter:   TradeCounter,
    trade_cap: u32,
    history:   Vec<TradeRecord>,
    journal:   VecDeque<TradeEvent>,
}

impl<M, I, C> Orchestrator<M, I, C>
where
    M: MarketDataGateway,
    I: IndicatorGateway,
    C: Clock,
{
    pub fn new(sampler: Sampler<M, I>, pacer: Pacer<C>, settings: &TradingSettings) -> Self {
        Self {
            sampler,
            pacer,
            machine:   PositionMachine::new(settings.exit_band_pct),
            ledger:    EquityLedger::new(settings.starting_balance, settings.leverage),
            counter:   TradeCounter::new(),
            trade_cap: settings.trade_cap,
            history:   Vec::new(),
            journal:   VecDeque::with_capacity(JOURNAL_SIZE),
        }
    }

    pub fn ledger(&self) -> &EquityLedger {
        &self.ledger
    }

    pub fn counter(&self) -> &TradeCounter {
        &self.counter
    }

    pub fn history(&self) -> &[TradeRecord] {
        &self.history
    }

    pub fn journal(&self) -> impl Iterator<Item = &TradeEvent> {
        self.journal.iter()
    }

    pub fn machine(&self) -> &PositionMachine {
        &self.machine
    }

    /// Run until the trade cap is reached or shutdown is requested.
    pub async fn run(&mut self) -> SessionSummary {
        let stop = self.run_loop().await;

        if let Some(position) = self.machine.state().open_position() {
            warn!(
                direction = %position.direction,
                entry     = position.entry_price,
                "Stopping with a simulated position still open — not booked"
            );
        }

        let summary = SessionSummary {
            stop,
            total_trades:     self.counter.value(),
            round_trips:      self.counter.round_trips(),
            penalties:        self.counter.penalties(),
            starting_balance: self.ledger.starting_balance(),
            leverage:         self.ledger.leverage(),
            balance:          self.ledger.balance(),
            profit_pct:       self.ledger.profit_pct(),
        };
        info!(
            stop         = ?summary.stop,
            total_trades = summary.total_trades,
            balance      = summary.balance,
            profit_pct   = summary.profit_pct,
            "Session finished"
        );
        summary
    }

    async fn run_loop(&mut self) -> StopReason {
        if self.pacer.align().await.is_err() {
            return StopReason::Shutdown;
        }

        loop {
            if self.counter.reached(self.trade_cap) {
                return StopReason::TradeCapReached;
            }

            let outcome = self.run_cycle().await;
            self.flush_sampler_events();

            match outcome {
                Ok(()) => {}
                Err(TradeError::Cancelled) => return StopReason::Shutdown,
                Err(TradeError::MarketData(e)) => {
                    warn!(error = %e, "Market data unavailable — retrying after backoff");
                    if self.pacer.backoff().await.is_err() {
                        return StopReason::Shutdown;
                    }
                }
                Err(e) => error!(error = %e, "Cycle abandoned"),
            }

            self.report_status();

            if self.pacer.poll_delay().await.is_err() || self.pacer.align().await.is_err() {
                return StopReason::Shutdown;
            }
        }
    }

    /// One outer cycle: sample, maybe trade a full position lifecycle.
    async fn run_cycle(&mut self) -> Result<(), TradeError> {
        let ctx = self.sampler.sample(self.pacer.now(), &mut self.counter).await?;
        self.flush_sampler_events();

        let Some(direction) = evaluate_entry(&ctx) else {
            debug!(round = ctx.round, close = ctx.close(), stale = ctx.indicators.is_stale(), "No entry");
            return Ok(());
        };

        let Some(position) = self.machine.open(direction, &ctx) else {
            return Ok(());
        };
        self.emit(TradeEvent::PositionOpened {
            direction,
            price: position.entry_price,
            at:    position.opened_at,
        });

        let (exit, reason) = self
            .machine
            .wait_for_exit(&mut self.sampler, &mut self.pacer, &mut self.counter)
            .await?;
        self.flush_sampler_events();

        self.machine.close();
        let balance = self
            .ledger
            .apply_trade_result(position.entry_price, exit.close(), direction)?;
        self.counter.record_round_trip();

        self.history.push(TradeRecord::new(
            self.sampler.symbol(),
            &position,
            exit.close(),
            exit.market.sampled_at,
            reason,
            balance,
        ));
        self.emit(TradeEvent::PositionClosed {
            direction,
            entry_price: position.entry_price,
            exit_price:  exit.close(),
            reason,
            balance,
            at:          exit.market.sampled_at,
        });

        Ok(())
    }

    fn report_status(&mut self) {
        self.emit(TradeEvent::Status {
            total_trades: self.counter.value(),
            profit_pct:   self.ledger.profit_pct(),
            balance:      self.ledger.balance(),
        });
    }

    /// Stale-indicator events queued by the sampler go out in order.
    fn flush_sampler_events(&mut self) {
        for event in self.sampler.take_events() {
            self.emit(event);
        }
    }

    fn emit(&mut self, event: TradeEvent) {
        info!(event = %event.to_json(), "{event}");
        if self.journal.len() >= JOURNAL_SIZE {
            self.journal.pop_front();
        }
        self.journal.push_back(event);
    }
}
