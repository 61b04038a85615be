//! The request gate: one-stop wiring of the admission engine.
//!
//! `QuotaGate` bundles a [`QuotaLedger`] with a route map and the stock
//! infrastructure (system clock, sharded store, default policy table) so an
//! HTTP pipeline only has to hand over the request identity, route name,
//! and method, and render the returned outcome.

use crate::application::ledger::QuotaLedger;
use crate::application::metrics::Metrics;
use crate::application::ports::Clock;
use crate::application::table::{PolicyTable, TableError};
use crate::domain::counter::WindowCounter;
use crate::domain::decision::Decision;
use crate::domain::principal::{QuotaKey, RequestIdentity};
use crate::domain::scope::PolicyScope;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::eviction::LruEviction;
use crate::infrastructure::response::{throttled_body, RateLimitHeaders};
use crate::infrastructure::routes::{HttpMethod, RouteMap};
use crate::infrastructure::storage::ShardedStore;
use std::sync::Arc;
use std::time::SystemTime;

/// Error returned when building a QuotaGate fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Maximum keys must be greater than zero
    ZeroMaxKeys,
    /// Policy table validation failed
    Table(TableError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ZeroMaxKeys => {
                write!(f, "max_keys must be greater than 0")
            }
            BuildError::Table(e) => {
                write!(f, "policy table error: {e}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<TableError> for BuildError {
    fn from(e: TableError) -> Self {
        BuildError::Table(e)
    }
}

/// The outcome of gating one request: the decision plus everything the
/// HTTP layer needs to render it.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// The scope the request resolved to
    pub scope: PolicyScope,
    /// The governing rule's limit
    pub limit: u32,
    /// The admission decision
    pub decision: Decision,
}

impl RequestOutcome {
    /// Whether the request may proceed.
    pub fn allowed(&self) -> bool {
        self.decision.allowed
    }

    /// Rate-limit headers for the response (attached on allow and deny).
    ///
    /// Denials need `now` to compute the `Retry-After` hint; use
    /// [`RequestOutcome::headers_at`] for that.
    pub fn headers(&self) -> RateLimitHeaders {
        RateLimitHeaders::from_decision(self.limit, &self.decision)
    }

    /// Rate-limit headers including `Retry-After` on denials.
    pub fn headers_at(&self, now: SystemTime) -> RateLimitHeaders {
        if self.decision.allowed {
            RateLimitHeaders::from_decision(self.limit, &self.decision)
        } else {
            RateLimitHeaders::for_denial(self.limit, &self.decision, now)
        }
    }

    /// The HTTP 429 JSON body, or `None` for an admitted request.
    pub fn deny_body(&self, now: SystemTime) -> Option<String> {
        if self.decision.allowed {
            None
        } else {
            Some(throttled_body(&self.decision, now))
        }
    }
}

type DefaultStore = Arc<ShardedStore<QuotaKey, WindowCounter>>;

/// Admission gate for an HTTP request pipeline.
///
/// Construct one gate at process start and share it (cheap clone) across
/// request handlers. A gate never errors per request: quota exhaustion and
/// clock failure both surface as denied outcomes.
///
/// # Example
/// ```
/// use quota_gate::{HttpMethod, PolicyScope, QuotaGate, RequestIdentity};
///
/// let gate = QuotaGate::builder().build().unwrap();
///
/// let identity = RequestIdentity::anonymous("203.0.113.5");
/// let outcome = gate.check(&identity, "auth/login", HttpMethod::Post);
///
/// assert_eq!(outcome.scope, PolicyScope::Login);
/// assert!(outcome.allowed());
/// for (name, value) in outcome.headers().to_pairs() {
///     // attach to the response
///     let _ = (name, value);
/// }
/// ```
#[derive(Clone)]
pub struct QuotaGate {
    ledger: QuotaLedger<DefaultStore>,
    routes: RouteMap,
}

impl QuotaGate {
    /// Start building a gate.
    pub fn builder() -> QuotaGateBuilder {
        QuotaGateBuilder::default()
    }

    /// A gate with the stock policy table, standard auth routes, and
    /// default key cap.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default gate configuration is valid")
    }

    /// Gate one request: resolve its scope and principal, then consult the
    /// ledger.
    pub fn check(&self, identity: &RequestIdentity, route: &str, method: HttpMethod) -> RequestOutcome {
        let scope = self
            .routes
            .scope_for(route, method, identity.is_authenticated());
        let rule = self.ledger.table().rule_for(scope);
        let principal = identity.principal_for(rule.keyed_by);
        let limit = rule.limit;

        let decision = self.ledger.check_and_consume(&principal, scope);
        RequestOutcome {
            scope,
            limit,
            decision,
        }
    }

    /// Gate one request at an explicit time (deterministic tests, upstream
    /// timestamps).
    pub fn check_at(
        &self,
        identity: &RequestIdentity,
        route: &str,
        method: HttpMethod,
        now: SystemTime,
    ) -> RequestOutcome {
        let scope = self
            .routes
            .scope_for(route, method, identity.is_authenticated());
        let rule = self.ledger.table().rule_for(scope);
        let principal = identity.principal_for(rule.keyed_by);
        let limit = rule.limit;

        let decision = self.ledger.check_and_consume_at(&principal, scope, now);
        RequestOutcome {
            scope,
            limit,
            decision,
        }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &QuotaLedger<DefaultStore> {
        &self.ledger
    }

    /// The gate's metrics handle.
    pub fn metrics(&self) -> &Metrics {
        self.ledger.metrics()
    }

    /// Number of live quota counters.
    pub fn key_count(&self) -> usize {
        self.ledger.key_count()
    }

    /// Remove counters idle for at least `idle_windows` windows.
    pub fn sweep_idle(&self, idle_windows: u32) -> usize {
        self.ledger.sweep_idle(idle_windows)
    }
}

impl Default for QuotaGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a [`QuotaGate`].
pub struct QuotaGateBuilder {
    table: PolicyTable,
    routes: RouteMap,
    clock: Option<Arc<dyn Clock>>,
    max_keys: Option<usize>,
}

impl Default for QuotaGateBuilder {
    fn default() -> Self {
        Self {
            table: PolicyTable::default(),
            routes: RouteMap::standard(),
            clock: None,
            max_keys: Some(100_000),
        }
    }
}

impl QuotaGateBuilder {
    /// Use a custom policy table.
    ///
    /// Table validation lives in [`PolicyTable::new`]; by the time a table
    /// exists it is complete and well-formed.
    pub fn with_table(mut self, table: PolicyTable) -> Self {
        self.table = table;
        self
    }

    /// Use a custom route map.
    pub fn with_routes(mut self, routes: RouteMap) -> Self {
        self.routes = routes;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Cap the number of tracked quota counters.
    ///
    /// When the cap is exceeded the least recently seen counter is evicted.
    /// This bounds memory when keys are attacker-controlled (distinct
    /// anonymous addresses).
    ///
    /// Default: 100,000 keys.
    ///
    /// The value is validated when `build()` is called.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    /// Disable the key cap, allowing unbounded growth.
    ///
    /// Only reasonable when the idle sweeper runs and key cardinality is
    /// known to be bounded; a flood of distinct anonymous addresses will
    /// otherwise grow the store without limit.
    pub fn with_unlimited_keys(mut self) -> Self {
        self.max_keys = None;
        self
    }

    /// Build the gate.
    ///
    /// # Errors
    /// Returns [`BuildError::ZeroMaxKeys`] for a zero cap. Table problems
    /// surface earlier, from [`PolicyTable::new`].
    pub fn build(self) -> Result<QuotaGate, BuildError> {
        if self.max_keys == Some(0) {
            return Err(BuildError::ZeroMaxKeys);
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        let store: DefaultStore = Arc::new(ShardedStore::new());
        let mut ledger = QuotaLedger::new(store, clock, Arc::new(self.table), Metrics::new());
        if let Some(max_keys) = self.max_keys {
            ledger = ledger.with_key_cap(Arc::new(LruEviction::new(max_keys)));
        }

        Ok(QuotaGate {
            ledger,
            routes: self.routes,
        })
    }
}
