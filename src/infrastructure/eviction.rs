//! Eviction policy adapters for the bounded counter store.
//!
//! The source system this models retained throttle counters for as long as
//! its cache kept them, which is unbounded in the worst case. Here the cap
//! is explicit: when the store exceeds its key limit, an adapter picks the
//! victim.

use crate::application::ports::{EvictionCandidate, EvictionPolicy};

/// LRU eviction policy with an entry count cap.
///
/// Evicts the entry that last saw a request longest ago whenever the store
/// holds more than `max_entries` counters. Ties resolve to the first
/// candidate in iteration order.
#[derive(Debug, Clone, Copy)]
pub struct LruEviction {
    /// Maximum number of entries retained
    max_entries: usize,
}

impl LruEviction {
    /// Create an LRU eviction policy with the given entry cap.
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }
}

impl<K> EvictionPolicy<K> for LruEviction
where
    K: Clone,
{
    fn select_victim(&self, candidates: &[EvictionCandidate<K>]) -> Option<K> {
        candidates
            .iter()
            .min_by_key(|candidate| candidate.last_seen)
            .map(|candidate| candidate.key.clone())
    }

    fn should_evict(&self, current_entries: usize) -> bool {
        current_entries > self.max_entries
    }
}
