//! Domain layer - Core business logic and models.
//!
//! Pure signal-gating logic: no I/O, no clocks, no transport. All types
//! are serializable and testable in isolation (hexagonal architecture
//! inner ring).

pub mod daily;
pub mod ledger;
pub mod phase;
pub mod profit;
pub mod risk_gate;
pub mod signal;

// Re-export core types for convenience
pub use daily::DailyStats;
pub use ledger::{ClosedTrade, LedgerError, Position, PositionLedger};
pub use phase::{AutomationPhase, InvalidPhase};
pub use profit::{ProfitState, ProfitTracker, WithdrawalRecommendation};
pub use risk_gate::{RiskGate, RiskVerdict};
pub use signal::{DecisionResult, RawSignal, Signal, SignalAction, SignalParseError};
