//! Fixed-window quota counters.

use crate::domain::decision::Decision;
use std::time::{Duration, SystemTime};

/// Mutable per-key quota state: a count within the current window.
///
/// The window is *fixed*, not sliding: once `window` has elapsed since
/// `window_start`, the counter resets entirely and a new window begins at
/// the triggering request. A burst straddling a window boundary can
/// therefore admit up to `2 x limit` requests within a short span. That is
/// the intended fixed-window semantics, not a bug; changing it to a
/// sliding log would change observable limits.
///
/// # Example
/// ```
/// use quota_gate::WindowCounter;
/// use std::time::{Duration, SystemTime, UNIX_EPOCH};
///
/// let t0 = UNIX_EPOCH + Duration::from_secs(1_000);
/// let mut counter = WindowCounter::new(t0);
/// let window = Duration::from_secs(60);
///
/// let first = counter.register(2, window, t0);
/// assert!(first.allowed);
/// assert_eq!(first.remaining, 1);
///
/// let second = counter.register(2, window, t0);
/// assert!(second.allowed);
/// assert_eq!(second.remaining, 0);
///
/// let third = counter.register(2, window, t0);
/// assert!(!third.allowed);
/// assert_eq!(third.reset_at, t0 + window);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCounter {
    count: u32,
    window_start: SystemTime,
    last_seen: SystemTime,
}

impl WindowCounter {
    /// Create a fresh counter whose window starts now.
    pub fn new(now: SystemTime) -> Self {
        Self {
            count: 0,
            window_start: now,
            last_seen: now,
        }
    }

    /// Register one request against this counter and decide admission.
    ///
    /// Callers must hold exclusive access for the duration of the call; the
    /// read-increment-write is a single critical section per key.
    ///
    /// A `now` earlier than `window_start` (clock moved backwards) is
    /// treated as still inside the current window; the counter never resets
    /// on time regression.
    pub fn register(&mut self, limit: u32, window: Duration, now: SystemTime) -> Decision {
        let elapsed = now
            .duration_since(self.window_start)
            .unwrap_or(Duration::ZERO);
        if elapsed >= window {
            self.count = 0;
            self.window_start = now;
        }
        self.last_seen = now;

        let allowed = self.count < limit;
        if allowed {
            self.count += 1;
        }

        Decision {
            allowed,
            remaining: limit.saturating_sub(self.count),
            reset_at: self.window_start + window,
        }
    }

    /// Requests counted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// When the current window began.
    pub fn window_start(&self) -> SystemTime {
        self.window_start
    }

    /// When this counter last saw a request. Used for LRU eviction.
    pub fn last_seen(&self) -> SystemTime {
        self.last_seen
    }

    /// Whether this counter has sat idle long enough to reclaim.
    ///
    /// True once `idle_windows` full windows have lapsed since the window
    /// started, i.e. the counter's own window plus at least
    /// `idle_windows - 1` further windows of silence.
    pub fn is_idle(&self, window: Duration, idle_windows: u32, now: SystemTime) -> bool {
        let threshold = window.saturating_mul(idle_windows.max(1));
        now.duration_since(self.window_start)
            .map(|elapsed| elapsed >= threshold)
            .unwrap_or(false)
    }
}
