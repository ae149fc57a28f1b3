//! Clock Port - Injectable Wall-Clock Time
//!
//! Rollover behavior depends only on signal arrival and the current
//! date, never on timers. Injecting the clock lets tests simulate
//! "no signals for N days" without waiting.

use chrono::{DateTime, Utc};

/// Source of wall-clock time.
pub trait Clock: Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
