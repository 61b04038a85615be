//! Observability metrics for admission decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same underlying counters, so a handle can be kept by a
/// health check while the ledger records into it.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Total number of requests admitted
    requests_admitted: AtomicU64,
    /// Total number of requests denied (quota exhausted or fail-closed)
    requests_denied: AtomicU64,
    /// Total number of counters reclaimed (idle sweep or LRU cap)
    keys_evicted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                requests_admitted: AtomicU64::new(0),
                requests_denied: AtomicU64::new(0),
                keys_evicted: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.requests_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_denied(&self) {
        self.inner.requests_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        self.inner.keys_evicted.fetch_add(count, Ordering::Relaxed);
    }

    /// Total requests admitted.
    pub fn requests_admitted(&self) -> u64 {
        self.inner.requests_admitted.load(Ordering::Relaxed)
    }

    /// Total requests denied.
    pub fn requests_denied(&self) -> u64 {
        self.inner.requests_denied.load(Ordering::Relaxed)
    }

    /// Total counters reclaimed.
    pub fn keys_evicted(&self) -> u64 {
        self.inner.keys_evicted.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_admitted: self.requests_admitted(),
            requests_denied: self.requests_denied(),
            keys_evicted: self.keys_evicted(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.requests_admitted.store(0, Ordering::Relaxed);
        self.inner.requests_denied.store(0, Ordering::Relaxed);
        self.inner.keys_evicted.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of requests admitted
    pub requests_admitted: u64,
    /// Total number of requests denied
    pub requests_denied: u64,
    /// Total number of counters reclaimed
    pub keys_evicted: u64,
}

impl MetricsSnapshot {
    /// Ratio of denied requests to total requests (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been processed.
    pub fn denial_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.requests_denied as f64 / total as f64
        }
    }

    /// Total requests processed (admitted + denied).
    pub fn total_requests(&self) -> u64 {
        self.requests_admitted.saturating_add(self.requests_denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.requests_admitted(), 0);
        assert_eq!(metrics.requests_denied(), 0);
        assert_eq!(metrics.keys_evicted(), 0);
    }

    #[test]
    fn test_recording() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_denied();
        metrics.record_evictions(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_admitted, 2);
        assert_eq!(snapshot.requests_denied, 1);
        assert_eq!(snapshot.keys_evicted, 3);
        assert_eq!(snapshot.total_requests(), 3);
    }

    #[test]
    fn test_denial_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().denial_rate(), 0.0);

        metrics.record_admitted();
        assert_eq!(metrics.snapshot().denial_rate(), 0.0);

        metrics.record_denied();
        assert!((metrics.snapshot().denial_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_denied();
        metrics.record_denied();
        assert!((metrics.snapshot().denial_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clone_shares_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_admitted();

        let metrics2 = metrics1.clone();
        metrics2.record_admitted();

        assert_eq!(metrics1.requests_admitted(), 2);
        assert_eq!(metrics2.requests_admitted(), 2);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_denied();
        metrics.record_evictions(1);

        metrics.reset();
        assert_eq!(metrics.snapshot().total_requests(), 0);
        assert_eq!(metrics.keys_evicted(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_admitted();
                    m.record_denied();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.requests_admitted(), 1000);
        assert_eq!(metrics.requests_denied(), 1000);
    }
}
