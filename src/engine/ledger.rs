//! # engine::ledger
//!
//! **Equity Ledger**: simulated account balance, touched only when a
//! position closes.
//!
//! ```text
//! long:  balance += (exit - entry) * leverage * balance / exit
//! short: balance -= (exit - entry) * leverage * balance / exit
//! ```

use serde::Serialize;

use crate::error::LedgerError;
use crate::models::Direction;

#[derive(Debug, Clone, Serialize)]
pub struct EquityLedger {
    starting_balance: f64,
    balance:          f64,
    leverage:         f64,
}

impl EquityLedger {
    pub fn new(starting_balance: f64, leverage: f64) -> Self {
        Self { starting_balance, balance: starting_balance, leverage }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn starting_balance(&self) -> f64 {
        self.starting_balance
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// Realised profit in percent of the starting balance.
    pub fn profit_pct(&self) -> f64 {
        (self.balance - self.starting_balance) / (self.starting_balance / 100.0)
    }

    /// Balance that closing `direction` from `entry` to `exit` would produce.
    /// Does not touch the ledger.
    pub fn project(&self, entry: f64, exit: f64, direction: Direction) -> Result<f64, LedgerError> {
        if !exit.is_finite() || exit <= 0.0 {
            return Err(LedgerError::NonPositiveExit(exit));
        }
        if !entry.is_finite() || entry <= 0.0 {
            return Err(LedgerError::NonPositiveEntry(entry));
        }

        let pnl = (exit - entry) * direction.sign() * self.leverage * self.balance / exit;
        Ok(self.balance + pnl)
    }

    /// Book a closed trade and return the new balance. On error the balance
    /// is left unchanged.
    pub fn apply_trade_result(
        &mut self,
        entry: f64,
        exit: f64,
        direction: Direction,
    ) -> Result<f64, LedgerError> {
        self.balance = self.project(entry, exit, direction)?;
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_win_scenario() {
        let mut ledger = EquityLedger::new(20000.0, 5.0);
        let balance = ledger.apply_trade_result(1000.0, 1010.0, Direction::Long).unwrap();
        assert!((balance - 20990.099).abs() < 1e-3);
        assert!((ledger.profit_pct() - 4.9505).abs() < 1e-3);
    }

    #[test]
    fn test_sign_symmetry() {
        let ledger = EquityLedger::new(20000.0, 5.0);
        let start = ledger.balance();

        assert!(ledger.project(1000.0, 1010.0, Direction::Long).unwrap() > start);
        assert!(ledger.project(1000.0, 990.0, Direction::Long).unwrap() < start);
        assert!(ledger.project(1000.0, 990.0, Direction::Short).unwrap() > start);
        assert!(ledger.project(1000.0, 1010.0, Direction::Short).unwrap() < start);

        let long_gain = ledger.project(1000.0, 1010.0, Direction::Long).unwrap() - start;
        let short_loss = start - ledger.project(1000.0, 1010.0, Direction::Short).unwrap();
        assert!((long_gain - short_loss).abs() < 1e-9);
    }

    #[test]
    fn test_flat_trade_keeps_balance() {
        let mut ledger = EquityLedger::new(20000.0, 5.0);
        ledger.apply_trade_result(1500.0, 1500.0, Direction::Short).unwrap();
        assert_eq!(ledger.balance(), 20000.0);
        assert_eq!(ledger.profit_pct(), 0.0);
    }

    #[test]
    fn test_rejects_bad_prices() {
        let mut ledger = EquityLedger::new(20000.0, 5.0);
        assert_eq!(
            ledger.apply_trade_result(1000.0, 0.0, Direction::Long),
            Err(LedgerError::NonPositiveExit(0.0))
        );
        assert_eq!(
            ledger.apply_trade_result(-1.0, 1000.0, Direction::Long),
            Err(LedgerError::NonPositiveEntry(-1.0))
        );
        assert!(ledger.apply_trade_result(1000.0, f64::NAN, Direction::Long).is_err());
        assert_eq!(ledger.balance(), 20000.0);
    }

    #[test]
    fn test_compounds_on_current_balance() {
        let mut ledger = EquityLedger::new(20000.0, 5.0);
        let first = ledger.apply_trade_result(1000.0, 1010.0, Direction::Long).unwrap();
        let second = ledger.apply_trade_result(1000.0, 1010.0, Direction::Long).unwrap();
        assert!((second - first) > (first - 20000.0));
    }
}
