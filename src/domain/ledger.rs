//! Position ledger - open positions and cooldown tracking.
//!
//! Owns every open position exclusively. Long-only: a BUY opens, a SELL
//! or external closure removes. The ledger enforces the at-most-one
//! position per instrument invariant and keeps the per-instrument
//! last-trade map the validator reads for cooldown checks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RiskLimits;

/// A single open long position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Instrument the position is in.
    pub instrument: String,
    /// Position size in instrument units, strictly positive.
    pub size: Decimal,
    /// Entry price, strictly positive.
    pub entry_price: Decimal,
    /// When the position was opened.
    pub opened_at: DateTime<Utc>,
    /// Informational stop-loss level; closure is externally driven.
    pub stop_loss: Decimal,
    /// Informational take-profit level; closure is externally driven.
    pub take_profit: Decimal,
}

/// Realized result of a closed position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClosedTrade {
    /// Absolute P&L: `(exit - entry) * size`.
    pub pnl: Decimal,
    /// Relative P&L: `(exit - entry) / entry * 100`.
    pub pnl_percent: Decimal,
}

/// Errors that indicate a broken ledger contract, not a business
/// rejection. The risk gate checks positions before any open/close, so
/// hitting one of these means an upstream bug; it is surfaced loudly
/// instead of silently corrected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    /// `open` called while a position already exists for the instrument.
    #[error("Invariant violation: position already open for {0}")]
    PositionExists(String),
    /// `close` called with no position for the instrument.
    #[error("Invariant violation: no open position for {0}")]
    NoPosition(String),
}

/// Tracks open positions and last executed-trade times per instrument.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
    last_trade_time: HashMap<String, DateTime<Utc>>,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position, computing informational stop-loss/take-profit
    /// levels from the configured limits.
    ///
    /// # Errors
    /// Returns [`LedgerError::PositionExists`] if the instrument already
    /// has an open position.
    pub fn open(
        &mut self,
        instrument: &str,
        size: Decimal,
        entry_price: Decimal,
        limits: &RiskLimits,
        now: DateTime<Utc>,
    ) -> Result<&Position, LedgerError> {
        self.open_with_levels(instrument, size, entry_price, None, None, limits, now)
    }

    /// Open a position with protective levels reported by the execution
    /// venue. Levels the venue did not report fall back to the
    /// limits-derived ones.
    ///
    /// # Errors
    /// Returns [`LedgerError::PositionExists`] if the instrument already
    /// has an open position.
    #[allow(clippy::too_many_arguments)]
    pub fn open_with_levels(
        &mut self,
        instrument: &str,
        size: Decimal,
        entry_price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        limits: &RiskLimits,
        now: DateTime<Utc>,
    ) -> Result<&Position, LedgerError> {
        if self.positions.contains_key(instrument) {
            return Err(LedgerError::PositionExists(instrument.to_string()));
        }

        let hundred = Decimal::from(100);
        let stop_loss = stop_loss
            .unwrap_or_else(|| entry_price * (Decimal::ONE - limits.stop_loss_percent / hundred));
        let take_profit = take_profit
            .unwrap_or_else(|| entry_price * (Decimal::ONE + limits.take_profit_percent / hundred));

        let position = Position {
            instrument: instrument.to_string(),
            size,
            entry_price,
            opened_at: now,
            stop_loss,
            take_profit,
        };

        info!(
            instrument,
            size = %size,
            entry = %entry_price,
            stop_loss = %stop_loss,
            take_profit = %take_profit,
            "Position opened"
        );

        self.last_trade_time.insert(instrument.to_string(), now);
        Ok(self
            .positions
            .entry(instrument.to_string())
            .or_insert(position))
    }

    /// Close the position for an instrument at the given exit price.
    ///
    /// # Errors
    /// Returns [`LedgerError::NoPosition`] if nothing is open.
    pub fn close(
        &mut self,
        instrument: &str,
        exit_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<ClosedTrade, LedgerError> {
        let position = self
            .positions
            .remove(instrument)
            .ok_or_else(|| LedgerError::NoPosition(instrument.to_string()))?;

        let pnl = (exit_price - position.entry_price) * position.size;
        let pnl_percent =
            (exit_price - position.entry_price) / position.entry_price * Decimal::from(100);

        info!(
            instrument,
            pnl = %pnl,
            pnl_percent = %pnl_percent,
            "Position closed"
        );

        self.last_trade_time.insert(instrument.to_string(), now);
        Ok(ClosedTrade { pnl, pnl_percent })
    }

    /// Get the open position for an instrument, if any.
    pub fn get(&self, instrument: &str) -> Option<&Position> {
        self.positions.get(instrument)
    }

    /// Number of currently open positions.
    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// All open positions (for status snapshots).
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// When the last executed trade for an instrument happened.
    pub fn last_trade_time(&self, instrument: &str) -> Option<DateTime<Utc>> {
        self.last_trade_time.get(instrument).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limits() -> RiskLimits {
        toml::from_str("").unwrap()
    }

    #[test]
    fn test_open_sets_protective_levels() {
        let mut ledger = PositionLedger::new();
        let pos = ledger
            .open("BTCUSDT", dec!(0.5), dec!(100), &limits(), Utc::now())
            .unwrap()
            .clone();
        // Defaults: 2% stop loss, 4% take profit
        assert_eq!(pos.stop_loss, dec!(98));
        assert_eq!(pos.take_profit, dec!(104));
    }

    #[test]
    fn test_reported_levels_override_the_defaults() {
        let mut ledger = PositionLedger::new();
        let pos = ledger
            .open_with_levels(
                "BTCUSDT",
                dec!(1),
                dec!(100),
                Some(dec!(95)),
                None,
                &limits(),
                Utc::now(),
            )
            .unwrap()
            .clone();
        assert_eq!(pos.stop_loss, dec!(95));
        // Unreported take profit falls back to the 4% default
        assert_eq!(pos.take_profit, dec!(104));
    }

    #[test]
    fn test_double_open_is_invariant_violation() {
        let mut ledger = PositionLedger::new();
        let now = Utc::now();
        ledger
            .open("BTCUSDT", dec!(1), dec!(100), &limits(), now)
            .unwrap();
        assert_eq!(
            ledger
                .open("BTCUSDT", dec!(1), dec!(100), &limits(), now)
                .unwrap_err(),
            LedgerError::PositionExists("BTCUSDT".to_string())
        );
    }

    #[test]
    fn test_round_trip_at_entry_price_is_zero_pnl() {
        let mut ledger = PositionLedger::new();
        let now = Utc::now();
        ledger
            .open("EURUSD", dec!(10), dec!(1.08), &limits(), now)
            .unwrap();
        let closed = ledger.close("EURUSD", dec!(1.08), now).unwrap();
        assert_eq!(closed.pnl, Decimal::ZERO);
        assert_eq!(closed.pnl_percent, Decimal::ZERO);
        assert!(ledger.get("EURUSD").is_none());
    }

    #[test]
    fn test_close_computes_pnl() {
        let mut ledger = PositionLedger::new();
        let now = Utc::now();
        ledger
            .open("BTCUSDT", dec!(2), dec!(100), &limits(), now)
            .unwrap();
        let closed = ledger.close("BTCUSDT", dec!(110), now).unwrap();
        assert_eq!(closed.pnl, dec!(20));
        assert_eq!(closed.pnl_percent, dec!(10));
    }

    #[test]
    fn test_close_without_position_is_invariant_violation() {
        let mut ledger = PositionLedger::new();
        assert_eq!(
            ledger.close("BTCUSDT", dec!(1), Utc::now()).unwrap_err(),
            LedgerError::NoPosition("BTCUSDT".to_string())
        );
    }

    #[test]
    fn test_trades_arm_the_cooldown_map() {
        let mut ledger = PositionLedger::new();
        let now = Utc::now();
        assert!(ledger.last_trade_time("BTCUSDT").is_none());
        ledger
            .open("BTCUSDT", dec!(1), dec!(100), &limits(), now)
            .unwrap();
        assert_eq!(ledger.last_trade_time("BTCUSDT"), Some(now));
    }
}
