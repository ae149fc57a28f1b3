//! Signal validation - allow-list, cooldown, and venue checks.
//!
//! Applies only to BUY and SELL. The allow-list and cooldown checks are
//! hard: failure rejects the signal. The venue catalog check is soft:
//! a definitive "not listed" rejects, but an unreachable venue only
//! logs a warning and lets the signal continue.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::config::{AccountConfig, RiskLimits};
use crate::domain::ledger::PositionLedger;
use crate::ports::market_catalog::{CatalogCheck, MarketCatalog};

/// Pre-trade checks that run before the risk gate.
pub struct SignalValidator {
    allowed_instruments: Vec<String>,
    cooldown: Duration,
    catalog: Option<Arc<dyn MarketCatalog>>,
}

impl SignalValidator {
    /// Build a validator from the account allow-list and risk limits.
    /// `catalog` is `None` when the venue check is disabled.
    pub fn new(
        account: &AccountConfig,
        limits: &RiskLimits,
        catalog: Option<Arc<dyn MarketCatalog>>,
    ) -> Self {
        Self {
            allowed_instruments: account.allowed_instruments.clone(),
            cooldown: Duration::minutes(limits.trade_cooldown_minutes),
            catalog,
        }
    }

    /// Allow-list check. Returns the rejection reason when the
    /// instrument is not configured for trading.
    pub fn check_allowed(&self, instrument: &str) -> Option<String> {
        if self.allowed_instruments.iter().any(|i| i == instrument) {
            None
        } else {
            Some(format!("Instrument not in allowed list: {instrument}"))
        }
    }

    /// Cooldown check against the ledger's last-executed-trade map.
    /// Only executed trades arm the cooldown; rejected and logged
    /// signals never do.
    pub fn check_cooldown(
        &self,
        instrument: &str,
        ledger: &PositionLedger,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let last = ledger.last_trade_time(instrument)?;
        if now - last < self.cooldown {
            Some(format!("Trade cooldown active for {instrument}"))
        } else {
            None
        }
    }

    /// Soft venue catalog check. A definitive negative answer rejects;
    /// an unavailable venue is logged and treated as passing.
    pub async fn check_venue(&self, instrument: &str) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        match catalog.check_instrument(instrument).await {
            CatalogCheck::Listed => None,
            CatalogCheck::NotListed => {
                Some(format!("Instrument not listed on venue: {instrument}"))
            }
            CatalogCheck::Unavailable => {
                warn!(instrument, "Venue catalog unavailable, skipping check");
                None
            }
        }
    }
}
