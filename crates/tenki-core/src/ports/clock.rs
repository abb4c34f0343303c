//! Clock port: time as an injected capability.

use chrono::{DateTime, Utc};

/// Provides the current instant.
///
/// Expiry math runs against this trait instead of the ambient clock, so
/// tests can simulate elapsed time deterministically rather than sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
