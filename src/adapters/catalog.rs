//! Venue Catalog Client - Cached Instrument Existence Lookups
//!
//! Fetches the venue's tradable-market list over HTTP and caches the
//! symbol set for a configurable refresh window. Lookups are strictly
//! time-bounded by the client timeout; any fetch failure falls back to
//! the stale cache, and with no cache at all the check reports
//! unavailable instead of blocking or rejecting.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::ports::market_catalog::{CatalogCheck, MarketCatalog};

/// Tolerant market-list payload. Venues either wrap the symbol list in
/// a `symbols` field or return a flat array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MarketsResponse {
    Wrapped { symbols: Vec<SymbolEntry> },
    Flat(Vec<SymbolEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SymbolEntry {
    Named { symbol: String },
    Plain(String),
}

impl SymbolEntry {
    fn into_symbol(self) -> String {
        match self {
            Self::Named { symbol } | Self::Plain(symbol) => symbol,
        }
    }
}

struct CachedSymbols {
    symbols: HashSet<String>,
    fetched_at: Instant,
}

/// HTTP-backed market catalog with a refresh-windowed symbol cache.
pub struct VenueCatalog {
    client: reqwest::Client,
    markets_url: String,
    refresh: Duration,
    cache: RwLock<Option<CachedSymbols>>,
}

impl VenueCatalog {
    /// Build a catalog client from configuration.
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build catalog HTTP client")?;

        Ok(Self {
            client,
            markets_url: config.markets_url.clone(),
            refresh: Duration::from_secs(config.refresh_seconds),
            cache: RwLock::new(None),
        })
    }

    async fn fetch_symbols(&self) -> Result<HashSet<String>> {
        let response = self
            .client
            .get(&self.markets_url)
            .send()
            .await
            .context("Catalog request failed")?
            .error_for_status()
            .context("Catalog returned an error status")?;

        let markets: MarketsResponse = response
            .json()
            .await
            .context("Failed to parse catalog response")?;

        let symbols = match markets {
            MarketsResponse::Wrapped { symbols } | MarketsResponse::Flat(symbols) => symbols,
        };
        Ok(symbols.into_iter().map(SymbolEntry::into_symbol).collect())
    }

    /// Answer from cache when fresh, otherwise refetch. A failed fetch
    /// keeps serving the stale set.
    async fn lookup(&self, instrument: &str) -> CatalogCheck {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < self.refresh {
                    return listed(&cached.symbols, instrument);
                }
            }
        }

        match self.fetch_symbols().await {
            Ok(symbols) => {
                info!(count = symbols.len(), "Venue catalog refreshed");
                let check = listed(&symbols, instrument);
                *self.cache.write().await = Some(CachedSymbols {
                    symbols,
                    fetched_at: Instant::now(),
                });
                check
            }
            Err(e) => {
                let cache = self.cache.read().await;
                match cache.as_ref() {
                    Some(cached) => {
                        warn!(error = %e, "Catalog refresh failed, using stale symbol set");
                        listed(&cached.symbols, instrument)
                    }
                    None => {
                        warn!(error = %e, "Catalog fetch failed with no cached symbols");
                        CatalogCheck::Unavailable
                    }
                }
            }
        }
    }
}

fn listed(symbols: &HashSet<String>, instrument: &str) -> CatalogCheck {
    if symbols.contains(instrument) {
        CatalogCheck::Listed
    } else {
        debug!(instrument, "Instrument absent from venue catalog");
        CatalogCheck::NotListed
    }
}

#[async_trait]
impl MarketCatalog for VenueCatalog {
    async fn check_instrument(&self, instrument: &str) -> CatalogCheck {
        self.lookup(instrument).await
    }
}
