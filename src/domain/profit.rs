//! Profit tracking and withdrawal recommendation.
//!
//! Accumulates realized P&L into the account balance and keeps the
//! withdrawable figure behind a retained trading buffer. The withdrawal
//! thresholds are policy constants, not derived values.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fraction of the starting balance retained as a trading buffer.
const BUFFER_FRACTION: Decimal = dec!(0.1);
/// Minimum total return (percent) before a withdrawal is recommended.
const MIN_RETURN_PERCENT: Decimal = dec!(5);
/// Minimum total profit (base currency) before a withdrawal is recommended.
const MIN_TOTAL_PROFIT: Decimal = dec!(100);
/// Minimum withdrawable amount worth recommending.
const MIN_WITHDRAWABLE: Decimal = dec!(50);

/// Account-level profit figures.
///
/// Invariant: `current_balance == starting_balance + total_profit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfitState {
    /// Balance at startup; never changes.
    pub starting_balance: Decimal,
    /// Balance after all realized P&L.
    pub current_balance: Decimal,
    /// Accumulated realized profit (may be negative).
    pub total_profit: Decimal,
    /// Profit eligible for withdrawal after the buffer; never negative.
    pub withdrawable_profit: Decimal,
}

/// Advice emitted alongside trade closures and status reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WithdrawalRecommendation {
    /// All three policy thresholds hold.
    pub should_withdraw: bool,
    /// Amount eligible for withdrawal.
    pub withdrawable_amount: Decimal,
    /// Total return over the starting balance, in percent.
    pub total_return_percent: Decimal,
}

/// Tracks realized profit and derives withdrawal advice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitTracker {
    state: ProfitState,
}

impl ProfitTracker {
    /// Start tracking from the configured balance.
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            state: ProfitState {
                starting_balance,
                current_balance: starting_balance,
                total_profit: Decimal::ZERO,
                withdrawable_profit: Decimal::ZERO,
            },
        }
    }

    /// Rebuild from a persisted state (restart recovery).
    pub fn from_state(state: ProfitState) -> Self {
        Self { state }
    }

    /// Current figures (read-only).
    pub fn state(&self) -> &ProfitState {
        &self.state
    }

    /// Balance the sizing formula works from.
    pub fn current_balance(&self) -> Decimal {
        self.state.current_balance
    }

    /// Apply a closed trade's P&L percent against the current balance.
    ///
    /// The percent is applied to the *current* balance (compounding),
    /// not the fixed starting balance. Recomputes the withdrawable
    /// figure with the retained buffer.
    pub fn record_closed_trade(&mut self, pnl_percent: Decimal) {
        let profit_amount = pnl_percent / Decimal::from(100) * self.state.current_balance;
        self.state.total_profit += profit_amount;
        self.state.current_balance = self.state.starting_balance + self.state.total_profit;

        let buffer = self.state.starting_balance * BUFFER_FRACTION;
        self.state.withdrawable_profit =
            (self.state.total_profit - buffer).max(Decimal::ZERO);

        info!(
            pnl_percent = %pnl_percent,
            profit_amount = %profit_amount.round_dp(2),
            balance = %self.state.current_balance.round_dp(2),
            "Closed trade recorded"
        );
    }

    /// Total return over the starting balance, in percent.
    pub fn total_return_percent(&self) -> Decimal {
        if self.state.starting_balance == Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.state.total_profit / self.state.starting_balance * Decimal::from(100)
    }

    /// Recommend withdrawal when all policy thresholds hold.
    pub fn withdrawal_recommendation(&self) -> WithdrawalRecommendation {
        let total_return = self.total_return_percent();
        let should_withdraw = total_return >= MIN_RETURN_PERCENT
            && self.state.total_profit >= MIN_TOTAL_PROFIT
            && self.state.withdrawable_profit >= MIN_WITHDRAWABLE;

        WithdrawalRecommendation {
            should_withdraw,
            withdrawable_amount: self.state.withdrawable_profit,
            total_return_percent: total_return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_invariant_holds() {
        let mut tracker = ProfitTracker::new(dec!(1000));
        for pnl in [dec!(0.5), dec!(-0.3), dec!(1.2), dec!(-0.8)] {
            tracker.record_closed_trade(pnl);
            let state = tracker.state();
            assert_eq!(
                state.current_balance,
                state.starting_balance + state.total_profit
            );
        }
    }

    #[test]
    fn test_profit_applied_to_current_balance() {
        let mut tracker = ProfitTracker::new(dec!(1000));
        tracker.record_closed_trade(dec!(10));
        // 10% of 1000 = 100
        assert_eq!(tracker.state().total_profit, dec!(100));
        tracker.record_closed_trade(dec!(10));
        // 10% of 1100 = 110, compounding
        assert_eq!(tracker.state().total_profit, dec!(210));
    }

    #[test]
    fn test_withdrawable_keeps_buffer() {
        let mut tracker = ProfitTracker::new(dec!(1000));
        tracker.record_closed_trade(dec!(15));
        // profit 150, buffer 100 => withdrawable 50
        assert_eq!(tracker.state().withdrawable_profit, dec!(50));
    }

    #[test]
    fn test_withdrawable_never_negative() {
        let mut tracker = ProfitTracker::new(dec!(1000));
        tracker.record_closed_trade(dec!(-5));
        assert_eq!(tracker.state().withdrawable_profit, Decimal::ZERO);
    }

    #[test]
    fn test_recommendation_requires_all_thresholds() {
        let mut tracker = ProfitTracker::new(dec!(1000));

        // 4% return: not enough
        tracker.record_closed_trade(dec!(4));
        assert!(!tracker.withdrawal_recommendation().should_withdraw);

        // Push past all three thresholds: return >= 5%, profit >= 100,
        // withdrawable >= 50
        tracker.record_closed_trade(dec!(11));
        let rec = tracker.withdrawal_recommendation();
        assert!(rec.should_withdraw);
        assert!(rec.withdrawable_amount >= dec!(50));
        assert!(rec.total_return_percent >= dec!(5));
    }

    #[test]
    fn test_small_account_never_recommends() {
        // 10% return on a tiny account stays under the absolute floors
        let mut tracker = ProfitTracker::new(dec!(100));
        tracker.record_closed_trade(dec!(10));
        assert!(!tracker.withdrawal_recommendation().should_withdraw);
    }
}
