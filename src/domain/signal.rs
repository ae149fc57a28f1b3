//! Core signal domain types.
//!
//! Defines the inbound signal model, the tolerant raw-payload form the
//! webhook layer hands over, and the tagged decision results the
//! processor returns. These types are the foundation of the hexagonal
//! architecture's inner ring.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::phase::AutomationPhase;
use crate::domain::profit::WithdrawalRecommendation;

/// Action carried by an inbound signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    /// Open a long position.
    Buy,
    /// Close the position for the instrument.
    Sell,
    /// Halt all trading immediately.
    EmergencyStop,
    /// Confirmation that an external venue executed a trade.
    TradeExecuted,
    /// Confirmation that an external venue closed a trade.
    TradeClosed,
}

impl SignalAction {
    /// Parse an action string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "EMERGENCY_STOP" => Some(Self::EmergencyStop),
            "TRADE_EXECUTED" => Some(Self::TradeExecuted),
            "TRADE_CLOSED" => Some(Self::TradeClosed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::EmergencyStop => write!(f, "EMERGENCY_STOP"),
            Self::TradeExecuted => write!(f, "TRADE_EXECUTED"),
            Self::TradeClosed => write!(f, "TRADE_CLOSED"),
        }
    }
}

/// Raw signal payload as received from the strategy source.
///
/// Field rules are deliberately tolerant: `symbol` is accepted as an
/// alias for `instrument`, `price` may arrive as a JSON number or a
/// numeric string, and unknown fields are ignored rather than rejected.
/// Strictness lives in [`Signal::from_raw`], which produces a typed
/// parse error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSignal {
    /// Action string (BUY, SELL, EMERGENCY_STOP, ...).
    #[serde(default)]
    pub action: String,
    /// Instrument identifier; `symbol` accepted as alias.
    #[serde(default, alias = "symbol")]
    pub instrument: Option<String>,
    /// Signal price, number or numeric string.
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    /// Strategy name (informational).
    #[serde(default)]
    pub strategy: Option<String>,
    /// Chart timeframe (informational).
    #[serde(default)]
    pub timeframe: Option<String>,
    /// Trade side reported by execution confirmations.
    #[serde(default)]
    pub side: Option<String>,
    /// Executed size, reported by TRADE_EXECUTED confirmations.
    #[serde(default, alias = "lot_size")]
    pub size: Option<serde_json::Value>,
    /// Stop-loss level reported by the execution venue.
    #[serde(default)]
    pub stop_loss: Option<serde_json::Value>,
    /// Take-profit level reported by the execution venue.
    #[serde(default)]
    pub take_profit: Option<serde_json::Value>,
    /// Realized P&L percent, reported by TRADE_CLOSED confirmations.
    #[serde(default)]
    pub profit_percent: Option<serde_json::Value>,
}

impl RawSignal {
    /// Extract an optional decimal field, treating non-numeric values
    /// as a parse error rather than silently dropping them.
    pub fn decimal_field(
        value: Option<&serde_json::Value>,
        field: &'static str,
    ) -> Result<Option<Decimal>, SignalParseError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let parsed = match value {
            // Parse the literal digits; routing through f64 can distort
            // high-precision quotes.
            serde_json::Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
            }
            serde_json::Value::String(s) => {
                let text = s.trim();
                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .ok()
            }
            _ => None,
        };
        match parsed {
            Some(d) => Ok(Some(d)),
            None => Err(SignalParseError::NonNumeric {
                field,
                value: value.to_string(),
            }),
        }
    }
}

/// A validated trading signal, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The requested action.
    pub action: SignalAction,
    /// Instrument the signal applies to.
    pub instrument: String,
    /// Signal price, strictly positive.
    pub price: Decimal,
    /// Strategy that produced the signal, if reported.
    pub strategy: Option<String>,
    /// Chart timeframe, if reported.
    pub timeframe: Option<String>,
    /// When the signal was received.
    pub received_at: DateTime<Utc>,
}

impl Signal {
    /// Build a typed BUY/SELL signal from a raw payload.
    ///
    /// # Errors
    /// Returns a [`SignalParseError`] when the instrument or price is
    /// missing, non-numeric, or not strictly positive.
    pub fn from_raw(raw: &RawSignal, now: DateTime<Utc>) -> Result<Self, SignalParseError> {
        let action = SignalAction::parse(&raw.action)
            .ok_or_else(|| SignalParseError::UnknownAction(raw.action.clone()))?;

        let instrument = raw
            .instrument
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or(SignalParseError::MissingField("instrument"))?;

        let price = RawSignal::decimal_field(raw.price.as_ref(), "price")?
            .ok_or(SignalParseError::MissingField("price"))?;
        if price <= Decimal::ZERO {
            return Err(SignalParseError::NonPositivePrice(price));
        }

        Ok(Self {
            action,
            instrument,
            price,
            strategy: raw.strategy.clone(),
            timeframe: raw.timeframe.clone(),
            received_at: now,
        })
    }
}

/// Typed error for malformed signal payloads.
///
/// These map to the `error` decision variant - the caller discarded the
/// signal and no state was mutated.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SignalParseError {
    /// A required field was absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    /// A field was present but not numeric.
    #[error("Non-numeric value for {field}: {value}")]
    NonNumeric {
        field: &'static str,
        value: String,
    },
    /// The action string is not one of the supported actions.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    /// Price must be strictly positive.
    #[error("Price must be positive, got {0}")]
    NonPositivePrice(Decimal),
}

/// Final decision for one processed signal.
///
/// Serializes with a `status` tag so the webhook layer can pass it
/// straight through as the response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionResult {
    /// Signal recorded without validation or execution (SIGNAL_ONLY,
    /// and EMERGENCY_STOP acknowledgements).
    Logged {
        instrument: String,
        action: SignalAction,
        phase: AutomationPhase,
    },
    /// Signal passed validation and the risk gate; execution deferred
    /// to a human or external actor (SEMI_AUTO).
    Validated {
        instrument: String,
        action: SignalAction,
        quantity: Decimal,
    },
    /// Signal executed, or an external execution/closure confirmed.
    Executed {
        instrument: String,
        action: SignalAction,
        quantity: Decimal,
        price: Decimal,
        #[serde(skip_serializing_if = "Option::is_none")]
        pnl: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pnl_percent: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        withdrawal: Option<WithdrawalRecommendation>,
    },
    /// Signal denied by policy; reason strings are stable.
    Rejected { reason: String },
    /// Malformed signal or internal invariant violation.
    Error { reason: String },
    /// Action string not recognized.
    UnknownAction { action: String },
}

impl DecisionResult {
    /// Short label for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Logged { .. } => "logged",
            Self::Validated { .. } => "validated",
            Self::Executed { .. } => "executed",
            Self::Rejected { .. } => "rejected",
            Self::Error { .. } => "error",
            Self::UnknownAction { .. } => "unknown_action",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(json: serde_json::Value) -> RawSignal {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_buy_with_symbol_alias_and_string_price() {
        let raw = raw(serde_json::json!({
            "action": "buy",
            "symbol": "BTCUSDT",
            "price": "42000.5",
            "extra_field": true
        }));
        let signal = Signal::from_raw(&raw, Utc::now()).unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.instrument, "BTCUSDT");
        assert_eq!(signal.price, dec!(42000.5));
    }

    #[test]
    fn test_parse_numeric_price() {
        let raw = raw(serde_json::json!({
            "action": "SELL",
            "instrument": "EURUSD",
            "price": 1.0842
        }));
        let signal = Signal::from_raw(&raw, Utc::now()).unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.price > Decimal::ZERO);
    }

    #[test]
    fn test_numeric_price_keeps_literal_digits() {
        let raw = raw(serde_json::json!({
            "action": "BUY",
            "symbol": "BTCUSDT",
            "price": 64230.123456
        }));
        let signal = Signal::from_raw(&raw, Utc::now()).unwrap();
        assert_eq!(signal.price, dec!(64230.123456));
    }

    #[test]
    fn test_missing_price_is_parse_error() {
        let raw = raw(serde_json::json!({"action": "BUY", "symbol": "BTCUSDT"}));
        assert_eq!(
            Signal::from_raw(&raw, Utc::now()),
            Err(SignalParseError::MissingField("price"))
        );
    }

    #[test]
    fn test_non_numeric_price_is_parse_error() {
        let raw = raw(serde_json::json!({
            "action": "BUY",
            "symbol": "BTCUSDT",
            "price": "not-a-number"
        }));
        assert!(matches!(
            Signal::from_raw(&raw, Utc::now()),
            Err(SignalParseError::NonNumeric { field: "price", .. })
        ));
    }

    #[test]
    fn test_unknown_action() {
        let raw = raw(serde_json::json!({"action": "HOLD", "symbol": "BTCUSDT", "price": 1}));
        assert_eq!(
            Signal::from_raw(&raw, Utc::now()),
            Err(SignalParseError::UnknownAction("HOLD".to_string()))
        );
    }

    #[test]
    fn test_zero_price_rejected() {
        let raw = raw(serde_json::json!({"action": "BUY", "symbol": "BTCUSDT", "price": 0}));
        assert!(matches!(
            Signal::from_raw(&raw, Utc::now()),
            Err(SignalParseError::NonPositivePrice(_))
        ));
    }

    #[test]
    fn test_decision_serializes_with_status_tag() {
        let decision = DecisionResult::Rejected {
            reason: "Emergency stop active".to_string(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "Emergency stop active");
    }

    #[test]
    fn test_action_display_round_trip() {
        for action in [
            SignalAction::Buy,
            SignalAction::Sell,
            SignalAction::EmergencyStop,
            SignalAction::TradeExecuted,
            SignalAction::TradeClosed,
        ] {
            assert_eq!(SignalAction::parse(&action.to_string()), Some(action));
        }
    }
}
