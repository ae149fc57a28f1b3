//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        instruments = config.account.allowed_instruments.len(),
        risk_percent = %config.risk.risk_percent,
        max_daily_trades = config.risk.max_daily_trades,
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive numeric values where required
/// - Sensible risk limits
/// - Non-empty instrument allow-list
fn validate_config(config: &AppConfig) -> Result<()> {
    let hundred = Decimal::from(100);

    // Account validation
    anyhow::ensure!(
        config.account.starting_balance > Decimal::ZERO,
        "starting_balance must be positive, got {}",
        config.account.starting_balance
    );
    anyhow::ensure!(
        !config.account.allowed_instruments.is_empty(),
        "At least one allowed instrument must be configured"
    );
    for (i, instrument) in config.account.allowed_instruments.iter().enumerate() {
        anyhow::ensure!(
            !instrument.is_empty(),
            "Allowed instrument {i} is empty"
        );
    }

    // Risk validation
    anyhow::ensure!(
        config.risk.risk_percent > Decimal::ZERO && config.risk.risk_percent <= Decimal::from(5),
        "risk_percent must be in (0, 5], got {}",
        config.risk.risk_percent
    );
    anyhow::ensure!(
        config.risk.stop_loss_percent > Decimal::ZERO,
        "stop_loss_percent must be positive, got {}",
        config.risk.stop_loss_percent
    );
    anyhow::ensure!(
        config.risk.take_profit_percent > Decimal::ZERO,
        "take_profit_percent must be positive"
    );
    anyhow::ensure!(
        config.risk.max_positions > 0,
        "max_positions must be at least 1"
    );
    anyhow::ensure!(
        config.risk.max_position_percent > Decimal::ZERO
            && config.risk.max_position_percent <= hundred,
        "max_position_percent must be in (0, 100], got {}",
        config.risk.max_position_percent
    );
    anyhow::ensure!(
        config.risk.min_position_size >= Decimal::ZERO,
        "min_position_size must not be negative"
    );
    anyhow::ensure!(
        config.risk.max_daily_loss_percent > Decimal::ZERO
            && config.risk.max_daily_loss_percent <= hundred,
        "max_daily_loss_percent must be in (0, 100], got {}",
        config.risk.max_daily_loss_percent
    );
    anyhow::ensure!(
        config.risk.max_daily_trades > 0,
        "max_daily_trades must be at least 1"
    );
    anyhow::ensure!(
        config.risk.max_consecutive_losses > 0,
        "max_consecutive_losses must be at least 1"
    );
    anyhow::ensure!(
        config.risk.trade_cooldown_minutes >= 0,
        "trade_cooldown_minutes must not be negative"
    );
    anyhow::ensure!(
        config.risk.history_retention > 0,
        "history_retention must be at least 1"
    );

    // Server validation
    anyhow::ensure!(
        !config.server.bind_address.is_empty(),
        "Server bind_address must not be empty"
    );
    anyhow::ensure!(
        config.server.max_signals_per_minute > 0,
        "max_signals_per_minute must be at least 1"
    );

    // Catalog validation: URL is only required when the check is enabled
    if config.catalog.enabled {
        anyhow::ensure!(
            !config.catalog.markets_url.is_empty(),
            "catalog.markets_url must be set when the catalog check is enabled"
        );
        anyhow::ensure!(
            config.catalog.timeout_ms > 0,
            "catalog.timeout_ms must be positive"
        );
    }

    Ok(())
}
