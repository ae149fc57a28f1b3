//! Repository Port - Durable Trade Journal and State Snapshots
//!
//! Persistence is advisory for signal decisions: a failed write is
//! logged and never blocks or reverses a decision that already
//! happened. Snapshots make restarts resume with the same balance,
//! positions, and daily counters.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::daily::DailyStats;
use crate::domain::ledger::PositionLedger;
use crate::domain::phase::AutomationPhase;
use crate::domain::profit::ProfitState;

/// One journaled signal decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique record id.
    pub id: Uuid,
    /// When the signal was processed.
    pub timestamp: DateTime<Utc>,
    /// Instrument the signal named, when it named one.
    pub instrument: Option<String>,
    /// Raw action string as received.
    pub action: String,
    /// Decision label (logged, validated, executed, rejected, ...).
    pub decision: String,
    /// Rejection or error reason, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Sized or executed quantity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// Signal price, if the payload carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Realized P&L for closures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    /// Realized P&L percent for closures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_percent: Option<Decimal>,
    /// Automation phase at decision time.
    pub phase: AutomationPhase,
}

/// Everything needed to resume after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreStateSnapshot {
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Automation phase at snapshot time.
    pub phase: AutomationPhase,
    /// Whether the emergency stop was tripped.
    pub emergency_stop: bool,
    /// Account profit figures.
    pub profit: ProfitState,
    /// Daily counters, including the date they belong to.
    pub daily: DailyStats,
    /// Open positions and per-instrument cooldown times.
    pub ledger: PositionLedger,
}

/// Trait for trade-journal and snapshot persistence.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Append one decision record to the journal.
    async fn append_trade(&self, record: &TradeRecord) -> Result<()>;

    /// Persist the full core state, replacing any previous snapshot.
    async fn save_snapshot(&self, snapshot: &CoreStateSnapshot) -> Result<()>;

    /// Load the latest snapshot, `None` on first start.
    async fn load_snapshot(&self) -> Result<Option<CoreStateSnapshot>>;

    /// Whether the backing store is currently writable.
    async fn is_healthy(&self) -> bool;
}
