//! Daily trading statistics with lazy date rollover.
//!
//! There is no background scheduler: the rollover is checked on every
//! incoming signal (and status read) against an injected clock, and
//! resets the counters exactly once per date change.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Rolling per-day counters consumed by the risk gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStats {
    /// Trades executed today (opens and closes both count).
    pub trade_count: u32,
    /// Winning closures today.
    pub wins: u32,
    /// Losing closures today.
    pub losses: u32,
    /// Losing closures in a row; reset by any win.
    pub consecutive_losses: u32,
    /// Accumulated realized P&L for the day, in percent.
    pub pnl_percent: Decimal,
    /// The date these counters belong to.
    pub day: NaiveDate,
}

impl DailyStats {
    /// Fresh counters for the given date.
    pub fn new(day: NaiveDate) -> Self {
        Self {
            trade_count: 0,
            wins: 0,
            losses: 0,
            consecutive_losses: 0,
            pnl_percent: Decimal::ZERO,
            day,
        }
    }

    /// Reset the counters if the wall-clock date advanced past `day`.
    ///
    /// Idempotent within a day: the second call for the same date is a
    /// no-op. Returns whether a reset happened so the caller can apply
    /// rollover side effects (e.g. clearing the emergency stop).
    pub fn rollover_if_new_day(&mut self, today: NaiveDate) -> bool {
        if today <= self.day {
            return false;
        }
        info!(
            previous_day = %self.day,
            trades = self.trade_count,
            wins = self.wins,
            losses = self.losses,
            pnl_percent = %self.pnl_percent,
            "New day - resetting daily stats"
        );
        *self = Self::new(today);
        true
    }

    /// Count one executed trade.
    pub fn record_trade(&mut self) {
        self.trade_count += 1;
    }

    /// Record a closed trade's realized P&L percent.
    ///
    /// A win resets the consecutive-loss streak; a flat closure counts
    /// as a win for streak purposes (it did not lose money).
    pub fn record_closure(&mut self, pnl_percent: Decimal) {
        self.pnl_percent += pnl_percent;
        if pnl_percent < Decimal::ZERO {
            self.losses += 1;
            self.consecutive_losses += 1;
        } else {
            self.wins += 1;
            self.consecutive_losses = 0;
        }
    }

    /// Closed trades today.
    pub fn total_closed(&self) -> u32 {
        self.wins + self.losses
    }

    /// Win rate over today's closures, in percent.
    pub fn win_rate(&self) -> Decimal {
        let total = self.total_closed();
        if total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.wins) / Decimal::from(total) * Decimal::from(100)
    }
}
