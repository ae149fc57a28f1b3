//! Signal processor - the single decision point for inbound signals.
//!
//! Every signal takes one pass through: date rollover, emergency-stop
//! check, validation, phase dispatch, risk gate, and (in FULL_AUTO)
//! execution against the ledger. One mutex spans the whole
//! read-then-write sequence, so concurrent signals serialize and no
//! check runs against stale state. The venue catalog lookup is the only
//! async step and runs before the lock is taken.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::daily::DailyStats;
use crate::domain::ledger::PositionLedger;
use crate::domain::phase::{AutomationPhase, InvalidPhase};
use crate::domain::profit::{ProfitState, ProfitTracker, WithdrawalRecommendation};
use crate::domain::risk_gate::RiskGate;
use crate::domain::signal::{
    DecisionResult, RawSignal, Signal, SignalAction, SignalParseError,
};
use crate::domain::Position;
use crate::ports::clock::Clock;
use crate::ports::market_catalog::MarketCatalog;
use crate::ports::repository::{CoreStateSnapshot, Repository, TradeRecord};
use crate::usecases::validator::SignalValidator;

/// A raw signal after pre-lock preparation, ready for the locked
/// decision pass.
enum PreparedSignal {
    Unknown,
    Malformed(SignalParseError),
    Emergency,
    Trade {
        signal: Signal,
        venue_reason: Option<String>,
    },
    ExecutionReport,
    ClosureReport,
}

/// Mutable core state guarded by the processor's mutex.
struct CoreState {
    phase: AutomationPhase,
    emergency_stop: bool,
    daily: DailyStats,
    ledger: PositionLedger,
    profit: ProfitTracker,
    history: VecDeque<TradeRecord>,
}

/// Full operational snapshot returned by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Current automation phase.
    pub phase: AutomationPhase,
    /// Whether the emergency stop is tripped.
    pub emergency_stop: bool,
    /// Account balance and profit figures.
    pub profit: ProfitState,
    /// Today's counters.
    pub daily: DailyStats,
    /// Win rate over today's closures, in percent.
    pub win_rate_percent: Decimal,
    /// Currently open positions.
    pub open_positions: Vec<Position>,
    /// Most recent decisions, newest first.
    pub recent_trades: Vec<TradeRecord>,
    /// Current withdrawal advice.
    pub withdrawal: WithdrawalRecommendation,
}

/// Orchestrates validation, gating, phase dispatch, and execution.
pub struct SignalProcessor {
    state: Mutex<CoreState>,
    gate: RiskGate,
    validator: SignalValidator,
    repository: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    clear_emergency_on_rollover: bool,
    history_retention: usize,
}

impl SignalProcessor {
    /// Wire a processor from configuration and its ports.
    pub fn new(
        config: &AppConfig,
        catalog: Option<Arc<dyn MarketCatalog>>,
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let validator = SignalValidator::new(&config.account, &config.risk, catalog);
        let now = clock.now();
        Self {
            state: Mutex::new(CoreState {
                phase: AutomationPhase::default(),
                emergency_stop: false,
                daily: DailyStats::new(now.date_naive()),
                ledger: PositionLedger::new(),
                profit: ProfitTracker::new(config.account.starting_balance),
                history: VecDeque::new(),
            }),
            gate: RiskGate::new(config.risk.clone()),
            validator,
            repository,
            clock,
            clear_emergency_on_rollover: config.risk.clear_emergency_on_rollover,
            history_retention: config.risk.history_retention,
        }
    }

    /// Process one inbound signal end to end and journal the decision.
    pub async fn process_signal(&self, raw: RawSignal) -> DecisionResult {
        let now = self.clock.now();
        let prepared = self.prepare(&raw, now).await;

        // The phase is captured inside the same critical section as the
        // decision, so the journal entry cannot observe a phase change
        // that lands between deciding and journaling.
        let (decision, phase) = {
            let mut state = self.lock_state();
            self.apply_rollover(&mut state, now);
            let decision = match prepared {
                PreparedSignal::Unknown => DecisionResult::UnknownAction {
                    action: raw.action.clone(),
                },
                PreparedSignal::Malformed(e) => DecisionResult::Error {
                    reason: e.to_string(),
                },
                PreparedSignal::Emergency => Self::handle_emergency_stop(&mut state, &raw),
                PreparedSignal::Trade {
                    signal,
                    venue_reason,
                } => self.handle_trade_signal(&mut state, &signal, venue_reason, now),
                PreparedSignal::ExecutionReport => {
                    self.handle_trade_executed(&mut state, &raw, now)
                }
                PreparedSignal::ClosureReport => self.handle_trade_closed(&mut state, &raw, now),
            };
            (decision, state.phase)
        };

        info!(
            action = %raw.action,
            instrument = raw.instrument.as_deref().unwrap_or("-"),
            decision = decision.label(),
            "Signal processed"
        );
        self.journal(&raw, &decision, phase, now).await;
        decision
    }

    /// Pre-lock preparation: action dispatch, payload parsing, and the
    /// soft venue lookup (the only async step), all before the state
    /// lock is taken.
    async fn prepare(&self, raw: &RawSignal, now: DateTime<Utc>) -> PreparedSignal {
        match SignalAction::parse(&raw.action) {
            None => PreparedSignal::Unknown,
            Some(SignalAction::EmergencyStop) => PreparedSignal::Emergency,
            Some(SignalAction::TradeExecuted) => PreparedSignal::ExecutionReport,
            Some(SignalAction::TradeClosed) => PreparedSignal::ClosureReport,
            Some(SignalAction::Buy | SignalAction::Sell) => match Signal::from_raw(raw, now) {
                Ok(signal) => {
                    // Only instruments that could pass the allow-list
                    // are worth a venue lookup.
                    let venue_reason =
                        if self.validator.check_allowed(&signal.instrument).is_none() {
                            self.validator.check_venue(&signal.instrument).await
                        } else {
                            None
                        };
                    PreparedSignal::Trade {
                        signal,
                        venue_reason,
                    }
                }
                Err(e) => PreparedSignal::Malformed(e),
            },
        }
    }

    /// Current automation phase.
    pub fn phase(&self) -> AutomationPhase {
        self.lock_state().phase
    }

    /// Switch the automation phase by name.
    ///
    /// # Errors
    /// Returns [`InvalidPhase`] for unknown phase names; the current
    /// phase is left untouched.
    pub fn set_phase(&self, phase: &str) -> Result<AutomationPhase, InvalidPhase> {
        let next: AutomationPhase = phase.parse()?;
        let mut state = self.lock_state();
        let previous = state.phase;
        state.phase = next;
        info!(%previous, %next, "Automation phase changed");
        Ok(next)
    }

    /// Trip the emergency stop manually.
    pub fn set_emergency_stop(&self) {
        let mut state = self.lock_state();
        state.emergency_stop = true;
        warn!("Emergency stop engaged manually");
    }

    /// Clear the emergency stop manually.
    pub fn reset_emergency_stop(&self) {
        let mut state = self.lock_state();
        state.emergency_stop = false;
        info!("Emergency stop cleared manually");
    }

    /// Operational status snapshot. Applies the lazy date rollover so a
    /// status read after midnight already shows fresh counters.
    pub fn status(&self) -> StatusReport {
        let now = self.clock.now();
        let mut state = self.lock_state();
        self.apply_rollover(&mut state, now);

        StatusReport {
            phase: state.phase,
            emergency_stop: state.emergency_stop,
            profit: state.profit.state().clone(),
            daily: state.daily.clone(),
            win_rate_percent: state.daily.win_rate(),
            open_positions: state.ledger.positions().cloned().collect(),
            recent_trades: state.history.iter().rev().take(10).cloned().collect(),
            withdrawal: state.profit.withdrawal_recommendation(),
        }
    }

    /// Capture the full core state for persistence.
    pub fn snapshot(&self) -> CoreStateSnapshot {
        let state = self.lock_state();
        CoreStateSnapshot {
            saved_at: self.clock.now(),
            phase: state.phase,
            emergency_stop: state.emergency_stop,
            profit: state.profit.state().clone(),
            daily: state.daily.clone(),
            ledger: state.ledger.clone(),
        }
    }

    /// Restore core state from a persisted snapshot (startup recovery).
    pub fn restore(&self, snapshot: CoreStateSnapshot) {
        let mut state = self.lock_state();
        state.phase = snapshot.phase;
        state.emergency_stop = snapshot.emergency_stop;
        state.daily = snapshot.daily;
        state.ledger = snapshot.ledger;
        state.profit = ProfitTracker::from_state(snapshot.profit);
        info!(
            saved_at = %snapshot.saved_at,
            phase = %state.phase,
            balance = %state.profit.current_balance(),
            open_positions = state.ledger.open_count(),
            "State restored from snapshot"
        );
    }

    // A poisoned lock means a panic mid-mutation elsewhere; the state
    // itself is still structurally valid, so recover the guard.
    fn lock_state(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_rollover(&self, state: &mut CoreState, now: DateTime<Utc>) {
        if state.daily.rollover_if_new_day(now.date_naive())
            && self.clear_emergency_on_rollover
            && state.emergency_stop
        {
            state.emergency_stop = false;
            info!("Emergency stop cleared by daily rollover");
        }
    }

    fn handle_emergency_stop(state: &mut CoreState, raw: &RawSignal) -> DecisionResult {
        state.emergency_stop = true;
        error!("EMERGENCY STOP activated by signal");
        DecisionResult::Logged {
            instrument: raw.instrument.clone().unwrap_or_else(|| "*".to_string()),
            action: SignalAction::EmergencyStop,
            phase: state.phase,
        }
    }

    fn handle_trade_signal(
        &self,
        state: &mut CoreState,
        signal: &Signal,
        venue_reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DecisionResult {
        // Metadata gaps are worth flagging but never reject a signal
        if signal.strategy.is_none() || signal.timeframe.is_none() {
            warn!(
                instrument = %signal.instrument,
                "Signal missing strategy or timeframe metadata"
            );
        }

        if state.emergency_stop {
            return DecisionResult::Rejected {
                reason: "Emergency stop active".to_string(),
            };
        }
        if let Some(reason) = self.validator.check_allowed(&signal.instrument) {
            return DecisionResult::Rejected { reason };
        }
        if let Some(reason) = self.validator.check_cooldown(&signal.instrument, &state.ledger, now)
        {
            return DecisionResult::Rejected { reason };
        }
        if let Some(reason) = venue_reason {
            return DecisionResult::Rejected { reason };
        }

        match state.phase {
            AutomationPhase::SignalOnly => DecisionResult::Logged {
                instrument: signal.instrument.clone(),
                action: signal.action,
                phase: state.phase,
            },
            AutomationPhase::SemiAuto => {
                let verdict = self.gate.check(
                    &signal.instrument,
                    signal.action,
                    signal.price,
                    state.profit.current_balance(),
                    &state.ledger,
                    &state.daily,
                );
                if verdict.allowed {
                    DecisionResult::Validated {
                        instrument: signal.instrument.clone(),
                        action: signal.action,
                        quantity: verdict.quantity,
                    }
                } else {
                    DecisionResult::Rejected {
                        reason: verdict.reason,
                    }
                }
            }
            AutomationPhase::FullAuto => {
                let verdict = self.gate.check(
                    &signal.instrument,
                    signal.action,
                    signal.price,
                    state.profit.current_balance(),
                    &state.ledger,
                    &state.daily,
                );
                if !verdict.allowed {
                    return DecisionResult::Rejected {
                        reason: verdict.reason,
                    };
                }
                if signal.action == SignalAction::Buy {
                    self.execute_buy(state, signal, verdict.quantity, now)
                } else {
                    self.execute_sell(state, signal, now)
                }
            }
        }
    }

    fn execute_buy(
        &self,
        state: &mut CoreState,
        signal: &Signal,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> DecisionResult {
        match state
            .ledger
            .open(&signal.instrument, quantity, signal.price, self.gate.limits(), now)
        {
            Ok(_) => {
                state.daily.record_trade();
                DecisionResult::Executed {
                    instrument: signal.instrument.clone(),
                    action: SignalAction::Buy,
                    quantity,
                    price: signal.price,
                    pnl: None,
                    pnl_percent: None,
                    withdrawal: None,
                }
            }
            Err(e) => {
                error!(instrument = %signal.instrument, error = %e, "Buy execution failed");
                DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn execute_sell(
        &self,
        state: &mut CoreState,
        signal: &Signal,
        now: DateTime<Utc>,
    ) -> DecisionResult {
        let quantity = state
            .ledger
            .get(&signal.instrument)
            .map(|p| p.size)
            .unwrap_or_default();
        match state.ledger.close(&signal.instrument, signal.price, now) {
            Ok(closed) => {
                state.daily.record_trade();
                let withdrawal =
                    self.settle_closure(state, closed.pnl_percent);
                DecisionResult::Executed {
                    instrument: signal.instrument.clone(),
                    action: SignalAction::Sell,
                    quantity,
                    price: signal.price,
                    pnl: Some(closed.pnl),
                    pnl_percent: Some(closed.pnl_percent),
                    withdrawal: Some(withdrawal),
                }
            }
            Err(e) => {
                error!(instrument = %signal.instrument, error = %e, "Sell execution failed");
                DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// External confirmation that a trade was executed elsewhere.
    /// A buy-side confirmation opens a tracked position with the
    /// venue-reported protective levels; a sell-side one closes it at
    /// the reported price.
    fn handle_trade_executed(
        &self,
        state: &mut CoreState,
        raw: &RawSignal,
        now: DateTime<Utc>,
    ) -> DecisionResult {
        let signal = match Signal::from_raw(raw, now) {
            Ok(s) => s,
            Err(e) => {
                return DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        };
        let side_is_sell = raw
            .side
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("sell"));

        if side_is_sell {
            let quantity = state
                .ledger
                .get(&signal.instrument)
                .map(|p| p.size)
                .unwrap_or_default();
            return match state.ledger.close(&signal.instrument, signal.price, now) {
                Ok(closed) => {
                    state.daily.record_trade();
                    let withdrawal = self.settle_closure(state, closed.pnl_percent);
                    DecisionResult::Executed {
                        instrument: signal.instrument.clone(),
                        action: SignalAction::TradeExecuted,
                        quantity,
                        price: signal.price,
                        pnl: Some(closed.pnl),
                        pnl_percent: Some(closed.pnl_percent),
                        withdrawal: Some(withdrawal),
                    }
                }
                Err(e) => DecisionResult::Error {
                    reason: e.to_string(),
                },
            };
        }

        let size = match RawSignal::decimal_field(raw.size.as_ref(), "size") {
            Ok(Some(size)) if size > Decimal::ZERO => size,
            Ok(_) => {
                return DecisionResult::Error {
                    reason: SignalParseError::MissingField("size").to_string(),
                }
            }
            Err(e) => {
                return DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        };
        // The venue's reported protective levels are authoritative;
        // missing ones fall back to the limits-derived defaults.
        let stop_loss = match RawSignal::decimal_field(raw.stop_loss.as_ref(), "stop_loss") {
            Ok(level) => level.filter(|l| *l > Decimal::ZERO),
            Err(e) => {
                return DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        };
        let take_profit = match RawSignal::decimal_field(raw.take_profit.as_ref(), "take_profit") {
            Ok(level) => level.filter(|l| *l > Decimal::ZERO),
            Err(e) => {
                return DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        };

        match state.ledger.open_with_levels(
            &signal.instrument,
            size,
            signal.price,
            stop_loss,
            take_profit,
            self.gate.limits(),
            now,
        ) {
            Ok(_) => {
                state.daily.record_trade();
                DecisionResult::Executed {
                    instrument: signal.instrument.clone(),
                    action: SignalAction::TradeExecuted,
                    quantity: size,
                    price: signal.price,
                    pnl: None,
                    pnl_percent: None,
                    withdrawal: None,
                }
            }
            Err(e) => {
                error!(instrument = %signal.instrument, error = %e, "Execution confirmation conflict");
                DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// External confirmation that a trade closed. Prefers closing a
    /// tracked position at the reported price; falls back to the
    /// explicit profit percent when nothing is tracked. Either way the
    /// closure counts as one trade for the daily counters.
    fn handle_trade_closed(
        &self,
        state: &mut CoreState,
        raw: &RawSignal,
        now: DateTime<Utc>,
    ) -> DecisionResult {
        let Some(instrument) = raw.instrument.clone().filter(|s| !s.is_empty()) else {
            return DecisionResult::Error {
                reason: SignalParseError::MissingField("instrument").to_string(),
            };
        };
        let price = match RawSignal::decimal_field(raw.price.as_ref(), "price") {
            Ok(p) => p,
            Err(e) => {
                return DecisionResult::Error {
                    reason: e.to_string(),
                }
            }
        };
        let explicit_percent =
            match RawSignal::decimal_field(raw.profit_percent.as_ref(), "profit_percent") {
                Ok(p) => p,
                Err(e) => {
                    return DecisionResult::Error {
                        reason: e.to_string(),
                    }
                }
            };

        let (quantity, exit_price, pnl, pnl_percent) = if state.ledger.get(&instrument).is_some() {
            let Some(price) = price.filter(|p| *p > Decimal::ZERO) else {
                return DecisionResult::Error {
                    reason: SignalParseError::MissingField("price").to_string(),
                };
            };
            let quantity = state
                .ledger
                .get(&instrument)
                .map(|p| p.size)
                .unwrap_or_default();
            match state.ledger.close(&instrument, price, now) {
                Ok(closed) => (quantity, price, Some(closed.pnl), closed.pnl_percent),
                Err(e) => {
                    return DecisionResult::Error {
                        reason: e.to_string(),
                    }
                }
            }
        } else if let Some(percent) = explicit_percent {
            (Decimal::ZERO, price.unwrap_or_default(), None, percent)
        } else {
            return DecisionResult::Error {
                reason: SignalParseError::MissingField("profit_percent").to_string(),
            };
        };

        state.daily.record_trade();
        let withdrawal = self.settle_closure(state, pnl_percent);
        DecisionResult::Executed {
            instrument,
            action: SignalAction::TradeClosed,
            quantity,
            price: exit_price,
            pnl,
            pnl_percent: Some(pnl_percent),
            withdrawal: Some(withdrawal),
        }
    }

    /// Book a closure into the daily counters and the profit tracker,
    /// and trip the emergency stop when a post-trade risk limit is
    /// breached.
    fn settle_closure(
        &self,
        state: &mut CoreState,
        pnl_percent: Decimal,
    ) -> WithdrawalRecommendation {
        state.daily.record_closure(pnl_percent);
        state.profit.record_closed_trade(pnl_percent);

        if state.daily.pnl_percent <= -self.gate.limits().max_daily_loss_percent {
            state.emergency_stop = true;
            error!(
                daily_pnl_percent = %state.daily.pnl_percent,
                "Daily loss limit breached, emergency stop engaged"
            );
        } else if state.daily.consecutive_losses >= self.gate.limits().max_consecutive_losses {
            state.emergency_stop = true;
            error!(
                consecutive_losses = state.daily.consecutive_losses,
                "Consecutive loss limit breached, emergency stop engaged"
            );
        }

        let recommendation = state.profit.withdrawal_recommendation();
        if recommendation.should_withdraw {
            info!(
                amount = %recommendation.withdrawable_amount.round_dp(2),
                total_return_percent = %recommendation.total_return_percent.round_dp(2),
                "Withdrawal recommended"
            );
        }
        recommendation
    }

    /// Record the decision in the in-memory history and the journal,
    /// stamped with the phase captured when the decision was made.
    /// Journal failures are logged, never surfaced to the caller.
    async fn journal(
        &self,
        raw: &RawSignal,
        decision: &DecisionResult,
        phase: AutomationPhase,
        now: DateTime<Utc>,
    ) {
        let (reason, quantity, price, pnl, pnl_percent) = match decision {
            DecisionResult::Validated { quantity, .. } => {
                (None, Some(*quantity), None, None, None)
            }
            DecisionResult::Executed {
                quantity,
                price,
                pnl,
                pnl_percent,
                ..
            } => (None, Some(*quantity), Some(*price), *pnl, *pnl_percent),
            DecisionResult::Rejected { reason } | DecisionResult::Error { reason } => {
                (Some(reason.clone()), None, None, None, None)
            }
            DecisionResult::Logged { .. } | DecisionResult::UnknownAction { .. } => {
                (None, None, None, None, None)
            }
        };

        let record = {
            let mut state = self.lock_state();
            let record = TradeRecord {
                id: Uuid::new_v4(),
                timestamp: now,
                instrument: raw.instrument.clone(),
                action: raw.action.clone(),
                decision: decision.label().to_string(),
                reason,
                quantity,
                price,
                pnl,
                pnl_percent,
                phase,
            };
            state.history.push_back(record.clone());
            while state.history.len() > self.history_retention {
                state.history.pop_front();
            }
            record
        };

        if let Err(e) = self.repository.append_trade(&record).await {
            warn!(error = %e, "Failed to journal trade record");
        }
    }
}
