//! Mock clock for testing.

use crate::application::ports::{Clock, ClockError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug)]
struct MockState {
    now: SystemTime,
    failing: bool,
}

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, enabling
/// deterministic testing of window resets and idle sweeps, and to simulate
/// clock failure to exercise the fail-closed denial path.
///
/// # Examples
///
/// ```
/// use quota_gate::infrastructure::mocks::MockClock;
/// use quota_gate::Clock;
/// use std::time::{Duration, SystemTime};
///
/// let start = SystemTime::now();
/// let clock = MockClock::new(start);
///
/// assert_eq!(clock.now().unwrap(), start);
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now().unwrap(), start + Duration::from_secs(10));
///
/// clock.fail(true);
/// assert!(clock.now().is_err());
/// ```
///
/// # Thread Safety
///
/// `MockClock` is thread-safe and can be cloned to share across threads.
/// All clones share the same underlying state, so advancing time in one
/// clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    state: Arc<Mutex<MockState>>,
}

impl MockClock {
    /// Create a mock clock starting at a specific time.
    pub fn new(start: SystemTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                now: start,
                failing: false,
            })),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut state = self
            .state
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        state.now += duration;
    }

    /// Set the clock to a specific time.
    pub fn set(&self, now: SystemTime) {
        let mut state = self
            .state
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        state.now = now;
    }

    /// Make subsequent readings fail (or recover).
    pub fn fail(&self, failing: bool) {
        let mut state = self
            .state
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        state.failing = failing;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Result<SystemTime, ClockError> {
        let state = self
            .state
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        if state.failing {
            return Err(ClockError);
        }
        Ok(state.now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let start = SystemTime::now();
        let clock = MockClock::new(start);

        assert_eq!(clock.now().unwrap(), start);

        clock.advance(Duration::from_secs(10));
        assert_eq!(clock.now().unwrap(), start + Duration::from_secs(10));

        let new_time = start + Duration::from_secs(100);
        clock.set(new_time);
        assert_eq!(clock.now().unwrap(), new_time);
    }

    #[test]
    fn test_failure_simulation() {
        let clock = MockClock::new(SystemTime::now());
        clock.fail(true);
        assert!(clock.now().is_err());

        clock.fail(false);
        assert!(clock.now().is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let start = SystemTime::now();
        let clock = MockClock::new(start);
        let clone = clock.clone();

        clone.advance(Duration::from_secs(5));
        assert_eq!(clock.now().unwrap(), start + Duration::from_secs(5));
    }
}
