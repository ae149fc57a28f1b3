//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketCatalog`: soft instrument-existence check against the venue
//! - `Repository`: trade journal and state snapshot persistence
//! - `Clock`: injectable wall-clock time (tests simulate day rollover)

pub mod clock;
pub mod market_catalog;
pub mod repository;
