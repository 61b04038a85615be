//! Clock adapters for time operations.
//!
//! Provides SystemClock implementation for production use.
//!
//! # Testing
//!
//! See `MockClock` (in `crate::infrastructure::mocks`) for a controllable
//! test clock. Available with the `test-helpers` feature or in test builds.

use crate::application::ports::{Clock, ClockError};
use std::time::{SystemTime, UNIX_EPOCH};

/// System clock implementation using `SystemTime::now()`.
///
/// A reading before the Unix epoch is reported as a [`ClockError`]; the
/// ledger turns that into a fail-closed denial rather than trusting a
/// nonsensical timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<SystemTime, ClockError> {
        let now = SystemTime::now();
        if now.duration_since(UNIX_EPOCH).is_err() {
            return Err(ClockError);
        }
        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let t1 = clock.now().unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = clock.now().unwrap();

        assert!(t2 > t1);
    }
}
