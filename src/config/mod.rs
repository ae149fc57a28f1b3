//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. All risk
//! limits, allow-lists, and policy switches are externalized here -
//! nothing is hardcoded in the domain layer.

pub mod loader;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level bot configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the bot begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bot identity and metadata.
    pub bot: BotConfig,
    /// Trading account parameters.
    pub account: AccountConfig,
    /// Risk limits - immutable for the lifetime of the process.
    pub risk: RiskLimits,
    /// HTTP intake server configuration.
    pub server: ServerConfig,
    /// Venue market catalog configuration.
    pub catalog: CatalogConfig,
    /// Persistence configuration.
    pub persistence: PersistenceConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Human-readable bot name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Trading account parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Account balance at startup, in base currency units.
    pub starting_balance: Decimal,
    /// Instruments signals are accepted for. Everything else is rejected.
    pub allowed_instruments: Vec<String>,
}

/// Risk management limits.
///
/// Loaded once at startup and never mutated during operation.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskLimits {
    /// Fraction of the balance risked per trade, in percent.
    #[serde(default = "default_risk_percent")]
    pub risk_percent: Decimal,
    /// Stop-loss distance from entry, in percent.
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: Decimal,
    /// Take-profit distance from entry, in percent.
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: Decimal,
    /// Maximum concurrently open positions.
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Maximum position value as percent of balance.
    #[serde(default = "default_max_position_percent")]
    pub max_position_percent: Decimal,
    /// Minimum sized quantity; smaller orders are denied.
    #[serde(default = "default_min_position_size")]
    pub min_position_size: Decimal,
    /// Maximum realized daily loss, in percent of balance.
    #[serde(default = "default_max_daily_loss_percent")]
    pub max_daily_loss_percent: Decimal,
    /// Maximum trades per calendar day.
    #[serde(default = "default_max_daily_trades")]
    pub max_daily_trades: u32,
    /// Consecutive losing closures before trading halts.
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
    /// Minimum spacing between executed trades per instrument (minutes).
    #[serde(default = "default_cooldown_minutes")]
    pub trade_cooldown_minutes: i64,
    /// Whether the date rollover also clears a tripped emergency stop.
    #[serde(default = "default_true")]
    pub clear_emergency_on_rollover: bool,
    /// Trade records retained in memory before eviction.
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,
}

/// HTTP intake server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the webhook/status server.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Shared secret for webhook HMAC verification. Empty disables auth.
    #[serde(default)]
    pub webhook_secret: String,
    /// Maximum webhook requests per minute.
    #[serde(default = "default_max_signals")]
    pub max_signals_per_minute: u32,
}

/// Venue market catalog configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Whether the soft instrument-existence check runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Venue REST endpoint returning the tradable market list.
    #[serde(default)]
    pub markets_url: String,
    /// Upper bound on the catalog lookup (milliseconds).
    #[serde(default = "default_catalog_timeout")]
    pub timeout_ms: u64,
    /// How long a fetched symbol set stays fresh (seconds).
    #[serde(default = "default_catalog_refresh")]
    pub refresh_seconds: u64,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for JSONL trade journals and state snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// State snapshot interval (seconds).
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_seconds: u64,
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_risk_percent() -> Decimal {
    Decimal::ONE
}

fn default_stop_loss_percent() -> Decimal {
    Decimal::TWO
}

fn default_take_profit_percent() -> Decimal {
    Decimal::from(4)
}

fn default_max_positions() -> usize {
    3
}

fn default_max_position_percent() -> Decimal {
    Decimal::TEN
}

fn default_min_position_size() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_max_daily_loss_percent() -> Decimal {
    Decimal::TWO
}

fn default_max_daily_trades() -> u32 {
    10
}

fn default_max_consecutive_losses() -> u32 {
    3
}

fn default_cooldown_minutes() -> i64 {
    5
}

fn default_history_retention() -> usize {
    1000
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_signals() -> u32 {
    60
}

fn default_catalog_timeout() -> u64 {
    1500
}

fn default_catalog_refresh() -> u64 {
    300
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_snapshot_interval() -> u64 {
    60
}
