//! # quota-gate
//!
//! Scoped fixed-window request quotas and admission decisions for API
//! backends.
//!
//! This crate answers one question per incoming request: *may this
//! principal perform this class of operation right now?* It keeps a
//! fixed-window counter per (principal, scope) pair, checks it against a
//! static policy table, and returns an admit/deny decision with the quota
//! metadata (`remaining`, `reset_at`) a server needs for `X-RateLimit-*`
//! headers and HTTP 429 responses. Extracting identity from a request and
//! turning a denial into a response stay with the caller; the engine does
//! no I/O of its own.
//!
//! ## Quick Start
//!
//! ```rust
//! use quota_gate::{HttpMethod, QuotaGate, RequestIdentity};
//! use std::time::SystemTime;
//!
//! // Stock policy table, standard auth routes, bounded counter store.
//! let gate = QuotaGate::new();
//!
//! // Per request: hand over identity, route, and method.
//! let identity = RequestIdentity::authenticated("user42", "203.0.113.5");
//! let outcome = gate.check(&identity, "auth/me", HttpMethod::Get);
//!
//! if outcome.allowed() {
//!     // proceed; attach outcome.headers() to the response
//! } else {
//!     let _body = outcome.deny_body(SystemTime::now());
//!     // respond 429 with the body and headers
//! }
//! ```
//!
//! Or drive the ledger directly when routes and identities are resolved
//! elsewhere:
//!
//! ```rust
//! use quota_gate::{
//!     Metrics, PolicyScope, PolicyTable, Principal, QuotaLedger, ShardedStore, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! let ledger = QuotaLedger::new(
//!     Arc::new(ShardedStore::new()),
//!     Arc::new(SystemClock::new()),
//!     Arc::new(PolicyTable::default()),
//!     Metrics::new(),
//! );
//!
//! let decision = ledger.check_and_consume(
//!     &Principal::User("user42".into()),
//!     PolicyScope::Read,
//! );
//! assert!(decision.allowed);
//! ```
//!
//! ## The Policy Table
//!
//! Every scope reachable at runtime has exactly one rule; an incomplete
//! table is a construction error, never a per-request surprise. The stock
//! table:
//!
//! | Scope | Limit | Window | Keyed by |
//! |---|---|---|---|
//! | `login` | 5 | 1 hour | remote address |
//! | `register` | 5 | 1 hour | remote address |
//! | `token_refresh` | 10 | 1 minute | principal |
//! | `logout` | 20 | 1 minute | principal |
//! | `current_user` | 60 | 1 minute | principal |
//! | `read` | 100 | 1 minute | principal |
//! | `write` | 20 | 1 minute | principal |
//! | `anonymous_default` | 20 | 1 hour | remote address |
//! | `authenticated_default` | 100 | 1 minute | principal |
//!
//! Authentication endpoints key by remote address (an attacker without
//! credentials has no principal to key on); resource endpoints key by
//! principal, falling back to the address for anonymous callers.
//!
//! ## Fixed Windows, Deliberately
//!
//! Counters reset entirely when their window lapses. A burst straddling a
//! window boundary can therefore admit up to twice the limit within a
//! short span. This is the intended semantics of the fixed-window scheme -
//! cheaper than a sliding log and identical to what the modeled system
//! enforces - and it is pinned by tests so it does not get "fixed" into a
//! different policy by accident.
//!
//! ## Failure Posture
//!
//! Quota exhaustion is not an error: it is an `allowed = false` decision.
//! The only fault the engine can hit at request time is an unusable clock,
//! and it fails *closed* - denying the request - because a silent bypass
//! is worth more to an attacker than a spurious denial costs a legitimate
//! caller. All configuration problems (incomplete table, zero limits, zero
//! caps) fail construction instead.
//!
//! ## Memory Management
//!
//! Counters are created lazily and reclaimed two ways:
//!
//! - **Key cap** (default 100,000): when exceeded, the least recently seen
//!   counter is evicted.
//! - **Idle sweep**: [`IdleSweeper`] removes counters whose window lapsed
//!   two or more windows ago, on demand or (with the `async` feature) on a
//!   tokio interval.
//!
//! Neither mechanism changes admission behavior: a request after eviction
//! is indistinguishable from a first-ever request.
//!
//! ## Observability
//!
//! ```rust
//! # use quota_gate::QuotaGate;
//! # let gate = QuotaGate::new();
//! let snapshot = gate.metrics().snapshot();
//! println!("admitted: {}", snapshot.requests_admitted);
//! println!("denied:   {}", snapshot.requests_denied);
//! println!("denial rate: {:.2}%", snapshot.denial_rate() * 100.0);
//! println!("live counters: {}", gate.key_count());
//! ```
//!
//! Clock failures and evictions are reported through `tracing` (WARN and
//! DEBUG respectively); subscriber wiring is the application's business.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    counter::WindowCounter,
    decision::Decision,
    principal::{Principal, QuotaKey, RequestIdentity},
    rule::{PolicyRule, RuleError},
    scope::{KeySource, PolicyScope},
};

pub use application::{
    ledger::QuotaLedger,
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, ClockError, CounterStore, EvictionCandidate, EvictionPolicy},
    sweeper::{IdleSweeper, SweeperConfig, SweeperConfigError},
    table::{PolicyTable, TableError},
};

pub use infrastructure::{
    clock::SystemClock,
    eviction::LruEviction,
    gate::{BuildError, QuotaGate, QuotaGateBuilder, RequestOutcome},
    response::{throttled_body, RateLimitHeaders},
    routes::{HttpMethod, RouteMap, ScopeSelector},
    storage::ShardedStore,
};
