//! Admission decisions returned per request.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The verdict for one request: admit or deny, plus quota metadata.
///
/// Quota exhaustion is not an error; a denied decision is a normal outcome
/// the caller renders as HTTP 429 with the metadata carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// When the current window ends and the counter resets
    pub reset_at: SystemTime,
}

impl Decision {
    /// Denial issued when no trustworthy clock reading exists (fail closed).
    ///
    /// `reset_at` is pinned to the Unix epoch: it renders as `0` in headers
    /// and [`Decision::retry_after`] clamps to zero.
    pub(crate) fn denied_clock_unavailable() -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_at: UNIX_EPOCH,
        }
    }

    /// `reset_at` as Unix seconds, for `X-RateLimit-Reset`.
    ///
    /// Saturates to zero for pre-epoch values.
    pub fn reset_at_unix(&self) -> u64 {
        self.reset_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Time until the window resets, from the caller's `now`.
    ///
    /// Zero once the reset moment has passed.
    pub fn retry_after(&self, now: SystemTime) -> Duration {
        self.reset_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }
}
