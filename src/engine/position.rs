//! # engine::position
//!
//! **Position State Machine**
//!
//! ```text
//!            evaluate_entry = Long             exit found
//!   Flat ───────────────────────────▶ Long ─────────────────▶ Flat
//!     │      evaluate_entry = Short            exit found
//!     └─────────────────────────────▶ Short ────────────────▶ Flat
//! ```
//!
//! The machine owns only its own state.  Once a position is open the
//! exit-wait sub-loop runs to completion before control returns to the
//! orchestrator, so a position never spans two outer cycles.

use tracing::{debug, info, warn};

use crate::clock::{Clock, Pacer};
use crate::engine::counter::TradeCounter;
use crate::engine::sampler::Sampler;
use crate::engine::signal::evaluate_exit;
use crate::error::TradeError;
use crate::gateway::{IndicatorGateway, MarketDataGateway};
use crate::models::{CycleContext, Direction, ExitReason, OpenPosition, PositionState};

#[derive(Debug)]
pub struct PositionMachine {
    state:    PositionState,
    /// Price band (percent of entry) that forces an exit either way.
    band_pct: f64,
}

impl PositionMachine {
    pub fn new(band_pct: f64) -> Self {
        Self { state: PositionState::Flat, band_pct }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    /// Flat → Long/Short at the context's close.
    ///
    /// Returns `None` when a position is already open (no pyramiding).
    pub fn open(&mut self, direction: Direction, ctx: &CycleContext) -> Option<OpenPosition> {
        if !self.state.is_flat() {
            debug!(?direction, "Position already open — double entry blocked");
            return None;
        }

        let position = OpenPosition {
            direction,
            entry_price: ctx.close(),
            opened_at:   ctx.market.sampled_at,
        };
        self.state = PositionState::Open(position);
        Some(position)
    }

    /// Exit test for the current position against one sampling round.
    pub fn check_exit(&self, ctx: &CycleContext) -> Option<ExitReason> {
        let position = self.state.open_position()?;
        evaluate_exit(position, ctx, self.band_pct)
    }

    /// Long/Short → Flat, handing back the position that was closed.
    pub fn close(&mut self) -> Option<OpenPosition> {
        match std::mem::take(&mut self.state) {
            PositionState::Flat => None,
            PositionState::Open(position) => Some(position),
        }
    }

    /// **Exit-wait sub-loop.**
    ///
    /// Every pass: short poll delay, realign to the interval, resample
    /// (indicators, then close), test the exit.  Failed indicator fetches are
    /// already penalised by the sampler; failed market fetches are retried
    /// after a backoff.  Nothing
    /// here closes the position on bad data.
    pub async fn wait_for_exit<M, I, C>(
        &self,
        sampler: &mut Sampler<M, I>,
        pacer: &mut Pacer<C>,
        counter: &mut TradeCounter,
    ) -> Result<(CycleContext, ExitReason), TradeError>
    where
        M: MarketDataGateway,
        I: IndicatorGateway,
        C: Clock,
    {
        let Some(position) = self.state.open_position().copied() else {
            return Err(TradeError::NoOpenPosition);
        };

        loop {
            pacer.poll_delay().await?;
            let at = pacer.align().await?;

            let ctx = match sampler.sample_for_exit(at, counter).await {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(
                        error     = %e,
                        direction = %position.direction,
                        entry     = position.entry_price,
                        "Market data unavailable with position open — holding"
                    );
                    pacer.backoff().await?;
                    continue;
                }
            };

            if let Some(reason) = self.check_exit(&ctx) {
                info!(
                    direction = %position.direction,
                    entry     = position.entry_price,
                    exit      = ctx.close(),
                    %reason,
                    "Exit condition met"
                );
                return Ok((ctx, reason));
            }

            debug!(
                round     = ctx.round,
                close     = ctx.close(),
                stale     = ctx.indicators.is_stale(),
                unrealised = position.unrealised_move(ctx.close()),
                "Holding position"
            );
        }
    }
}
