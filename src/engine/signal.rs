//! # engine::signal
//!
//! **Signal Evaluator**. Pure functions, no state: the same context always
//! gives the same answer.
//!
//! ```text
//! Long  pattern: histogram > 0  AND macd > signal  AND vwap < close
//! Short pattern: histogram < 0  AND macd < signal  AND vwap > close
//! ```
//!
//! The two patterns need opposite comparisons on the same values, so at most
//! one can hold.  A stale indicator reading confirms nothing.

use crate::models::{CycleContext, Direction, ExitReason, IndicatorSnapshot, OpenPosition};

/// Relative slack on the band edge, so a move of exactly `band_pct` at a
/// decimal price still counts as reaching it.
const BAND_EPSILON: f64 = 1e-9;

/// Which directional pattern the indicators show at `close`, if any.
pub fn indicator_pattern(snapshot: &IndicatorSnapshot, close: f64) -> Option<Direction> {
    let bullish = snapshot.macd_histogram > 0.0
        && snapshot.macd_line > snapshot.macd_signal
        && snapshot.vwap < close;
    let bearish = snapshot.macd_histogram < 0.0
        && snapshot.macd_line < snapshot.macd_signal
        && snapshot.vwap > close;

    match (bullish, bearish) {
        (true, false) => Some(Direction::Long),
        (false, true) => Some(Direction::Short),
        _ => None,
    }
}

/// Entry decision for a flat book. Fails closed on stale indicators.
pub fn evaluate_entry(ctx: &CycleContext) -> Option<Direction> {
    let snapshot = ctx.indicators.fresh()?;
    indicator_pattern(snapshot, ctx.close())
}

/// Price-only exit: the close has travelled `band_pct` percent from entry.
pub fn band_exit(position: &OpenPosition, close: f64, band_pct: f64) -> Option<ExitReason> {
    let threshold = position.entry_price * band_pct / 100.0;
    let threshold = threshold - threshold.abs() * BAND_EPSILON;
    let moved = position.unrealised_move(close);

    if moved >= threshold {
        Some(ExitReason::TakeProfit)
    } else if moved <= -threshold {
        Some(ExitReason::StopLoss)
    } else {
        None
    }
}

/// Exit decision for an open position.
///
/// The opposite entry pattern closes the position; so does the price band,
/// which still applies when the indicators are stale.
pub fn evaluate_exit(position: &OpenPosition, ctx: &CycleContext, band_pct: f64) -> Option<ExitReason> {
    let reversal = ctx
        .indicators
        .fresh()
        .and_then(|snapshot| indicator_pattern(snapshot, ctx.close()))
        .filter(|&direction| direction == position.direction.opposite());

    if reversal.is_some() {
        return Some(ExitReason::Reversal);
    }
    band_exit(position, ctx.close(), band_pct)
}
