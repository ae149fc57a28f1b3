//! Prometheus Metrics Registry - Signal Pipeline Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers signal decisions, executed trades, balance, daily P&L, and
//! the emergency-stop / phase state.

use prometheus::{Encoder, Gauge, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::phase::AutomationPhase;
use crate::domain::signal::DecisionResult;
use crate::usecases::processor::StatusReport;

/// Centralized Prometheus metrics for the signal gate.
///
/// All metrics follow the naming convention `signal_gate_*`.
pub struct SignalMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Total processed signals, labelled by decision.
    pub signals_total: IntCounterVec,
    /// Total executed trades, labelled by action.
    pub trades_executed: IntCounterVec,
    /// Current account balance gauge.
    pub account_balance: Gauge,
    /// Today's realized P&L percent gauge.
    pub daily_pnl_percent: Gauge,
    /// Currently open positions gauge.
    pub open_positions: IntGauge,
    /// Emergency stop status (1 = tripped).
    pub emergency_stop_active: IntGauge,
    /// Automation phase indicator (1 on the active phase label).
    pub automation_phase: GaugeVec,
}

impl SignalMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let signals_total = IntCounterVec::new(
            Opts::new("signal_gate_signals_total", "Total processed signals"),
            &["decision"],
        )?;
        let trades_executed = IntCounterVec::new(
            Opts::new("signal_gate_trades_executed_total", "Total executed trades"),
            &["action"],
        )?;
        let account_balance = Gauge::new(
            "signal_gate_account_balance",
            "Current account balance in base currency",
        )?;
        let daily_pnl_percent = Gauge::new(
            "signal_gate_daily_pnl_percent",
            "Realized P&L percent for the current day",
        )?;
        let open_positions =
            IntGauge::new("signal_gate_open_positions", "Currently open positions")?;
        let emergency_stop_active = IntGauge::new(
            "signal_gate_emergency_stop_active",
            "Whether the emergency stop is tripped (1=yes, 0=no)",
        )?;
        let automation_phase = GaugeVec::new(
            Opts::new(
                "signal_gate_automation_phase",
                "Automation phase indicator (1 on the active phase)",
            ),
            &["phase"],
        )?;

        registry.register(Box::new(signals_total.clone()))?;
        registry.register(Box::new(trades_executed.clone()))?;
        registry.register(Box::new(account_balance.clone()))?;
        registry.register(Box::new(daily_pnl_percent.clone()))?;
        registry.register(Box::new(open_positions.clone()))?;
        registry.register(Box::new(emergency_stop_active.clone()))?;
        registry.register(Box::new(automation_phase.clone()))?;

        Ok(Self {
            registry,
            signals_total,
            trades_executed,
            account_balance,
            daily_pnl_percent,
            open_positions,
            emergency_stop_active,
            automation_phase,
        })
    }

    /// Count one decision; executed decisions also count per action.
    pub fn observe_decision(&self, decision: &DecisionResult) {
        self.signals_total
            .with_label_values(&[decision.label()])
            .inc();
        if let DecisionResult::Executed { action, .. } = decision {
            let label = action.to_string();
            self.trades_executed
                .with_label_values(&[label.as_str()])
                .inc();
        }
    }

    /// Refresh the state gauges from a status snapshot.
    pub fn update_from_status(&self, status: &StatusReport) {
        self.account_balance
            .set(status.profit.current_balance.to_f64().unwrap_or_default());
        self.daily_pnl_percent
            .set(status.daily.pnl_percent.to_f64().unwrap_or_default());
        self.open_positions.set(status.open_positions.len() as i64);
        self.emergency_stop_active
            .set(i64::from(status.emergency_stop));
        for phase in AutomationPhase::ALL {
            let active = if phase == status.phase { 1.0 } else { 0.0 };
            let label = phase.to_string();
            self.automation_phase
                .with_label_values(&[label.as_str()])
                .set(active);
        }
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
