//! Automation phase policy levels.
//!
//! The phase controls how far a validated signal travels: logging only,
//! validation without execution, or full execution. Transitions happen
//! only through an explicit administrative call - never from signal
//! content.

use serde::{Deserialize, Serialize};

/// Automation policy level for accepted BUY/SELL signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationPhase {
    /// Signals are logged only. Initial phase.
    #[default]
    SignalOnly,
    /// Signals are validated and risk-checked; execution stays manual.
    SemiAuto,
    /// Validated signals execute automatically.
    FullAuto,
}

impl AutomationPhase {
    /// All phases, in escalation order.
    pub const ALL: [Self; 3] = [Self::SignalOnly, Self::SemiAuto, Self::FullAuto];
}

impl std::fmt::Display for AutomationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignalOnly => write!(f, "SIGNAL_ONLY"),
            Self::SemiAuto => write!(f, "SEMI_AUTO"),
            Self::FullAuto => write!(f, "FULL_AUTO"),
        }
    }
}

/// Error for phase strings outside the three valid values.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Invalid phase: {0} (expected SIGNAL_ONLY, SEMI_AUTO, or FULL_AUTO)")]
pub struct InvalidPhase(pub String);

impl std::str::FromStr for AutomationPhase {
    type Err = InvalidPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIGNAL_ONLY" => Ok(Self::SignalOnly),
            "SEMI_AUTO" => Ok(Self::SemiAuto),
            "FULL_AUTO" => Ok(Self::FullAuto),
            other => Err(InvalidPhase(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(
            "semi_auto".parse::<AutomationPhase>(),
            Ok(AutomationPhase::SemiAuto)
        );
        assert_eq!(
            "FULL_AUTO".parse::<AutomationPhase>(),
            Ok(AutomationPhase::FullAuto)
        );
    }

    #[test]
    fn test_invalid_phase() {
        let err = "TURBO".parse::<AutomationPhase>().unwrap_err();
        assert_eq!(err, InvalidPhase("TURBO".to_string()));
    }

    #[test]
    fn test_default_is_signal_only() {
        assert_eq!(AutomationPhase::default(), AutomationPhase::SignalOnly);
    }

    #[test]
    fn test_display_round_trip() {
        for phase in AutomationPhase::ALL {
            assert_eq!(phase.to_string().parse::<AutomationPhase>(), Ok(phase));
        }
    }
}
