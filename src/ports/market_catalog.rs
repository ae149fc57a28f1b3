//! Market Catalog Port - Soft Venue Instrument Check
//!
//! The execution venue owns the authoritative list of tradable
//! instruments. This check is *soft*: when the venue is unreachable the
//! validator logs a warning and continues, because availability takes
//! priority over the catalogue check.

use async_trait::async_trait;

/// Result of a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogCheck {
    /// The venue lists the instrument.
    Listed,
    /// The venue is reachable and does not list the instrument.
    NotListed,
    /// The venue could not be reached; the check is inconclusive.
    Unavailable,
}

/// Trait for venue market-catalogue providers.
#[async_trait]
pub trait MarketCatalog: Send + Sync + 'static {
    /// Check whether the venue lists `instrument`.
    ///
    /// Implementations must be time-bounded; a slow venue answers
    /// `Unavailable`, it never stalls signal processing.
    async fn check_instrument(&self, instrument: &str) -> CatalogCheck;
}
