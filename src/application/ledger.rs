//! The quota ledger: the sole stateful admission authority.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, CounterStore, EvictionCandidate, EvictionPolicy};
use crate::application::table::PolicyTable;
use crate::domain::counter::WindowCounter;
use crate::domain::decision::Decision;
use crate::domain::principal::{Principal, QuotaKey};
use crate::domain::scope::PolicyScope;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Maintains one fixed-window counter per (principal, scope) key and
/// answers admission queries.
///
/// The ledger is an explicit, injectable instance: construct one at process
/// start and hand it (cheaply cloned) to every request handler. There is no
/// ambient global state, so tests can run independent ledgers side by side.
///
/// Each [`QuotaLedger::check_and_consume_at`] call mutates exactly one
/// counter, atomically with respect to concurrent calls for the same key;
/// calls for different keys do not contend (the store shards its locking).
/// No call blocks, errors, or panics for a well-formed (principal, scope)
/// pair - exhaustion is a normal `allowed = false` decision.
///
/// # Example
/// ```
/// use quota_gate::{
///     Metrics, PolicyScope, PolicyTable, Principal, QuotaLedger, ShardedStore, SystemClock,
/// };
/// use std::sync::Arc;
///
/// let ledger = QuotaLedger::new(
///     Arc::new(ShardedStore::new()),
///     Arc::new(SystemClock::new()),
///     Arc::new(PolicyTable::default()),
///     Metrics::new(),
/// );
///
/// let caller = Principal::RemoteAddr("203.0.113.5".into());
/// let decision = ledger.check_and_consume(&caller, PolicyScope::Login);
/// assert!(decision.allowed);
/// assert_eq!(decision.remaining, 4);
/// ```
#[derive(Clone)]
pub struct QuotaLedger<S>
where
    S: CounterStore<QuotaKey, WindowCounter> + Clone,
{
    store: S,
    clock: Arc<dyn Clock>,
    table: Arc<PolicyTable>,
    metrics: Metrics,
    cap: Option<Arc<dyn EvictionPolicy<QuotaKey>>>,
}

impl<S> QuotaLedger<S>
where
    S: CounterStore<QuotaKey, WindowCounter> + Clone,
{
    /// Create a ledger over a counter store, clock, and validated policy
    /// table.
    pub fn new(store: S, clock: Arc<dyn Clock>, table: Arc<PolicyTable>, metrics: Metrics) -> Self {
        Self {
            store,
            clock,
            table,
            metrics,
            cap: None,
        }
    }

    /// Bound the store with an eviction policy; the policy's
    /// `should_evict` threshold decides when counters are dropped.
    pub fn with_key_cap(mut self, policy: Arc<dyn EvictionPolicy<QuotaKey>>) -> Self {
        self.cap = Some(policy);
        self
    }

    /// Decide admission for one request, reading the injected clock.
    ///
    /// If the clock source is unavailable the ledger fails closed: the
    /// request is denied rather than admitted unmetered. An attacker gains
    /// more from a silent bypass than a legitimate caller loses to a
    /// spurious denial.
    pub fn check_and_consume(&self, principal: &Principal, scope: PolicyScope) -> Decision {
        match self.clock.now() {
            Ok(now) => self.check_and_consume_at(principal, scope, now),
            Err(error) => {
                warn!(%scope, %error, "clock unavailable, denying request");
                self.metrics.record_denied();
                Decision::denied_clock_unavailable()
            }
        }
    }

    /// Decide admission for one request at an explicit time.
    ///
    /// This is the deterministic core of the ledger; [`check_and_consume`]
    /// merely supplies `now` from the clock. Useful for tests and for
    /// callers that timestamp requests upstream.
    ///
    /// [`check_and_consume`]: QuotaLedger::check_and_consume
    pub fn check_and_consume_at(
        &self,
        principal: &Principal,
        scope: PolicyScope,
        now: SystemTime,
    ) -> Decision {
        let rule = self.table.rule_for(scope);
        let key = QuotaKey::new(principal, scope);

        let decision = self.store.with_entry_mut(
            key,
            || WindowCounter::new(now),
            |counter| counter.register(rule.limit, rule.window, now),
        );

        if decision.allowed {
            self.metrics.record_admitted();
        } else {
            self.metrics.record_denied();
        }

        self.enforce_cap();
        decision
    }

    /// Remove counters whose window lapsed at least `idle_windows` windows
    /// ago, reading the injected clock. Returns the number removed.
    ///
    /// Reclamation is invisible to admission: a fresh request after
    /// eviction behaves exactly like a first-ever request.
    pub fn sweep_idle(&self, idle_windows: u32) -> usize {
        match self.clock.now() {
            Ok(now) => self.sweep_idle_at(idle_windows, now),
            Err(error) => {
                warn!(%error, "clock unavailable, skipping idle sweep");
                0
            }
        }
    }

    /// Remove counters idle as of an explicit time.
    pub fn sweep_idle_at(&self, idle_windows: u32, now: SystemTime) -> usize {
        let before = self.store.len();
        self.store.retain(|key, counter| {
            let window = self.table.rule_for(key.scope()).window;
            !counter.is_idle(window, idle_windows, now)
        });
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            self.metrics.record_evictions(removed as u64);
            debug!(removed, "swept idle quota counters");
        }
        removed
    }

    /// Number of live counters.
    pub fn key_count(&self) -> usize {
        self.store.len()
    }

    /// Whether the ledger tracks no counters.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop all counters.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// The ledger's policy table.
    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    /// The ledger's metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn enforce_cap(&self) {
        let Some(policy) = &self.cap else {
            return;
        };

        while policy.should_evict(self.store.len()) {
            let mut candidates = Vec::new();
            self.store.for_each(|key, counter| {
                candidates.push(EvictionCandidate {
                    key: key.clone(),
                    last_seen: counter.last_seen(),
                })
            });

            let Some(victim) = policy.select_victim(&candidates) else {
                break;
            };
            if self.store.remove(&victim) {
                self.metrics.record_evictions(1);
                debug!(
                    scope = %victim.scope(),
                    "evicted quota counter over key cap"
                );
            } else {
                // Raced with a concurrent removal; re-check the cap.
                continue;
            }
        }
    }
}
