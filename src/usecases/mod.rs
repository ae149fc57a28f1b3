//! Use Cases Layer - Signal Processing Orchestration
//!
//! Coordinates the domain objects behind the ports: validation of
//! inbound signals, phase dispatch, risk gating, and state mutation.
//! This layer owns the single lock that makes every signal decision
//! atomic.

pub mod processor;
pub mod validator;

pub use processor::{SignalProcessor, StatusReport};
pub use validator::SignalValidator;
