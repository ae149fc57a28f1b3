//! Risk gate benchmark: every signal takes one pass through the gate
//! while holding the state lock, so check latency bounds webhook
//! throughput.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;

use signal_gate_bot::config::RiskLimits;
use signal_gate_bot::domain::{DailyStats, PositionLedger, RiskGate, SignalAction};

fn bench_gate_check(c: &mut Criterion) {
    let limits: RiskLimits = toml::from_str("").unwrap();
    let gate = RiskGate::new(limits.clone());
    let daily = DailyStats::new(Utc::now().date_naive());

    let empty_ledger = PositionLedger::new();
    c.bench_function("gate_check_buy_empty_ledger", |b| {
        b.iter(|| {
            gate.check(
                black_box("BTCUSDT"),
                SignalAction::Buy,
                black_box(dec!(42000.5)),
                black_box(dec!(10000)),
                &empty_ledger,
                &daily,
            )
        });
    });

    let mut full_ledger = PositionLedger::new();
    let now = Utc::now();
    for instrument in ["BTCUSDT", "ETHUSDT", "SOLUSDT"] {
        full_ledger
            .open(instrument, dec!(0.1), dec!(100), &limits, now)
            .unwrap();
    }
    c.bench_function("gate_check_buy_at_position_cap", |b| {
        b.iter(|| {
            gate.check(
                black_box("ADAUSDT"),
                SignalAction::Buy,
                black_box(dec!(0.45)),
                black_box(dec!(10000)),
                &full_ledger,
                &daily,
            )
        });
    });

    c.bench_function("gate_check_sell_with_position", |b| {
        b.iter(|| {
            gate.check(
                black_box("BTCUSDT"),
                SignalAction::Sell,
                black_box(dec!(105)),
                black_box(dec!(10000)),
                &full_ledger,
                &daily,
            )
        });
    });
}

criterion_group!(benches, bench_gate_check);
criterion_main!(benches);
