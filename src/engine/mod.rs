//! The trading core: signal evaluation, position lifecycle, equity and the
//! loop that ties them together.

pub mod counter;
pub mod ledger;
pub mod orchestrator;
pub mod position;
pub mod sampler;
pub mod signal;

pub use counter::TradeCounter;
pub use ledger::EquityLedger;
pub use orchestrator::{Orchestrator, SessionSummary, StopReason, TradingSettings};
pub use position::PositionMachine;
pub use sampler::Sampler;
