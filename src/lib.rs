//! Signal Gate Bot - Webhook Trading Signal Automation Core
//!
//! Receives strategy signals over a webhook, gates them through
//! capital-preservation risk checks, and dispatches them according to
//! a three-phase automation policy (log only, validate, execute).
//! Tracks positions, daily statistics, realized profit, and withdrawal
//! advice, with crash-safe file persistence.
//!
//! Layering (hexagonal):
//! - [`domain`]: pure decision logic and models, no I/O
//! - [`ports`]: traits the core requires from the outside world
//! - [`usecases`]: the signal processor orchestrating one atomic pass
//! - [`adapters`]: HTTP intake, venue catalog, files, Prometheus
//! - [`config`]: TOML configuration and validation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

pub use config::AppConfig;
pub use domain::{AutomationPhase, DecisionResult, RawSignal};
pub use usecases::{SignalProcessor, StatusReport};
