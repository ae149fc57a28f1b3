//! Property-based tests for the domain layer: sizing bounds, gate
//! determinism, profit accounting invariants, and ledger P&L signs.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use signal_gate_bot::config::RiskLimits;
use signal_gate_bot::domain::{
    DailyStats, PositionLedger, ProfitTracker, RiskGate, SignalAction,
};

fn limits() -> RiskLimits {
    toml::from_str("").unwrap()
}

/// Positive price with two decimal places, spanning pennies to tens of
/// thousands.
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..5_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn balance_strategy() -> impl Strategy<Value = Decimal> {
    (100i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Per-trade P&L percent in [-10, 10] with two decimal places.
fn pnl_percent_strategy() -> impl Strategy<Value = Decimal> {
    (-1000i64..=1000).prop_map(|bp| Decimal::new(bp, 2))
}

proptest! {
    #[test]
    fn allowed_buy_quantity_respects_both_caps(
        price in price_strategy(),
        balance in balance_strategy(),
    ) {
        let limits = limits();
        let gate = RiskGate::new(limits.clone());
        let ledger = PositionLedger::new();
        let daily = DailyStats::new(Utc::now().date_naive());

        let verdict = gate.check("BTCUSDT", SignalAction::Buy, price, balance, &ledger, &daily);
        if verdict.allowed {
            let hundred = Decimal::from(100);
            prop_assert!(verdict.quantity >= limits.min_position_size);

            // Rounding to 6 dp can overshoot the exact caps by half a unit
            let epsilon = dec!(0.000001);
            let risk_cap = (balance * limits.risk_percent / hundred)
                / (price * limits.stop_loss_percent / hundred);
            let value_cap = balance * limits.max_position_percent / hundred / price;
            prop_assert!(verdict.quantity <= risk_cap.min(value_cap) + epsilon);
        } else {
            prop_assert_eq!(verdict.quantity, Decimal::ZERO);
        }
    }

    #[test]
    fn gate_is_deterministic(
        price in price_strategy(),
        balance in balance_strategy(),
        trade_count in 0u32..20,
        consecutive_losses in 0u32..5,
    ) {
        let gate = RiskGate::new(limits());
        let ledger = PositionLedger::new();
        let mut daily = DailyStats::new(Utc::now().date_naive());
        daily.trade_count = trade_count;
        daily.consecutive_losses = consecutive_losses;

        let a = gate.check("BTCUSDT", SignalAction::Buy, price, balance, &ledger, &daily);
        let b = gate.check("BTCUSDT", SignalAction::Buy, price, balance, &ledger, &daily);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn profit_tracker_balance_invariant(
        pnls in prop::collection::vec(pnl_percent_strategy(), 0..50),
    ) {
        let starting = dec!(1000);
        let mut tracker = ProfitTracker::new(starting);

        for pnl in pnls {
            tracker.record_closed_trade(pnl);
            let state = tracker.state();
            prop_assert_eq!(
                state.current_balance,
                state.starting_balance + state.total_profit
            );
            prop_assert!(state.withdrawable_profit >= Decimal::ZERO);
            prop_assert!(state.withdrawable_profit <= state.total_profit.max(Decimal::ZERO));
        }
    }

    #[test]
    fn daily_stats_counters_are_consistent(
        pnls in prop::collection::vec(pnl_percent_strategy(), 0..50),
    ) {
        let mut daily = DailyStats::new(Utc::now().date_naive());
        for pnl in &pnls {
            daily.record_closure(*pnl);
        }
        prop_assert_eq!(daily.total_closed() as usize, pnls.len());
        prop_assert!(daily.consecutive_losses <= daily.losses);
        prop_assert!(daily.win_rate() <= Decimal::from(100));
    }

    #[test]
    fn ledger_pnl_sign_matches_price_move(
        entry in price_strategy(),
        exit in price_strategy(),
    ) {
        let mut ledger = PositionLedger::new();
        let now = Utc::now();
        ledger.open("BTCUSDT", dec!(1), entry, &limits(), now).unwrap();
        let closed = ledger.close("BTCUSDT", exit, now).unwrap();

        prop_assert_eq!(closed.pnl.is_sign_positive() && !closed.pnl.is_zero(), exit > entry);
        prop_assert_eq!(closed.pnl, (exit - entry) * dec!(1));
        prop_assert_eq!(closed.pnl_percent.is_zero(), exit == entry);
    }
}
