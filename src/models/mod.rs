//! Domain models shared across the trading loop.

pub mod market;
pub mod position;

pub use market::{CycleContext, IndicatorReading, IndicatorSnapshot, IndicatorValues, Interval, MarketSnapshot};
pub use position::{Direction, ExitReason, OpenPosition, PositionState, TradeRecord};
