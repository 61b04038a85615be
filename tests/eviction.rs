//! Integration tests for counter reclamation.
//!
//! Eviction must be observable only through `key_count()` and metrics -
//! never through admission results.

use quota_gate::{
    IdleSweeper, LruEviction, Metrics, PolicyScope, PolicyTable, Principal, QuotaKey, QuotaLedger,
    ShardedStore, SweeperConfig, SystemClock, WindowCounter,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

type TestLedger = QuotaLedger<Arc<ShardedStore<QuotaKey, WindowCounter>>>;

fn ledger() -> TestLedger {
    QuotaLedger::new(
        Arc::new(ShardedStore::new()),
        Arc::new(SystemClock::new()),
        Arc::new(PolicyTable::default()),
        Metrics::new(),
    )
}

fn t(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn idle_counters_are_swept() {
    let ledger = ledger();

    // Ten anonymous addresses hit the login endpoint once each.
    for i in 0..10 {
        let caller = Principal::RemoteAddr(format!("198.51.100.{i}"));
        ledger.check_and_consume_at(&caller, PolicyScope::Login, t(0));
    }
    assert_eq!(ledger.key_count(), 10);

    // One window later nothing is reclaimable yet (threshold: 2 windows).
    assert_eq!(ledger.sweep_idle_at(2, t(3_600)), 0);
    assert_eq!(ledger.key_count(), 10);

    // Two windows later everything is.
    assert_eq!(ledger.sweep_idle_at(2, t(7_200)), 10);
    assert_eq!(ledger.key_count(), 0);
    assert_eq!(ledger.metrics().keys_evicted(), 10);
}

#[test]
fn post_eviction_request_behaves_like_first_ever() {
    let ledger = ledger();
    let caller = Principal::RemoteAddr("203.0.113.9".into());

    // Exhaust the login quota, then let the counter go idle and sweep it.
    for _ in 0..6 {
        ledger.check_and_consume_at(&caller, PolicyScope::Login, t(0));
    }
    assert_eq!(ledger.sweep_idle_at(2, t(7_200)), 1);

    // Indistinguishable from a brand-new key.
    let decision = ledger.check_and_consume_at(&caller, PolicyScope::Login, t(7_201));
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 4);
    assert_eq!(decision.reset_at, t(7_201) + Duration::from_secs(3_600));
}

#[test]
fn sweep_respects_per_scope_windows() {
    let ledger = ledger();
    let caller = Principal::User("mixed".into());

    // read (60s window) and login (3600s window) counters created together.
    ledger.check_and_consume_at(&caller, PolicyScope::Read, t(0));
    ledger.check_and_consume_at(&caller, PolicyScope::Login, t(0));
    assert_eq!(ledger.key_count(), 2);

    // At t=120 only the read counter has sat out two of its windows.
    assert_eq!(ledger.sweep_idle_at(2, t(120)), 1);
    assert_eq!(ledger.key_count(), 1);

    // At t=7200 the login counter goes too.
    assert_eq!(ledger.sweep_idle_at(2, t(7_200)), 1);
    assert_eq!(ledger.key_count(), 0);
}

#[test]
fn key_cap_bounds_distinct_anonymous_addresses() {
    let ledger = ledger().with_key_cap(Arc::new(LruEviction::new(100)));

    // A flood of distinct addresses cannot grow the store past the cap.
    for i in 0..1_000u32 {
        let caller = Principal::RemoteAddr(format!("10.0.{}.{}", i / 256, i % 256));
        ledger.check_and_consume_at(&caller, PolicyScope::AnonymousDefault, t(u64::from(i)));
    }

    assert_eq!(ledger.key_count(), 100);
    assert_eq!(ledger.metrics().keys_evicted(), 900);
}

#[test]
fn lru_cap_keeps_recently_seen_keys() {
    let ledger = ledger().with_key_cap(Arc::new(LruEviction::new(2)));
    let old = Principal::User("old".into());
    let warm = Principal::User("warm".into());
    let new = Principal::User("new".into());

    ledger.check_and_consume_at(&old, PolicyScope::Read, t(0));
    ledger.check_and_consume_at(&warm, PolicyScope::Read, t(10));

    // Touch "old" again so "warm" becomes the LRU victim.
    ledger.check_and_consume_at(&old, PolicyScope::Read, t(20));
    ledger.check_and_consume_at(&new, PolicyScope::Read, t(30));

    assert_eq!(ledger.key_count(), 2);

    // "old" kept its window state: two requests already counted.
    let decision = ledger.check_and_consume_at(&old, PolicyScope::Read, t(31));
    assert_eq!(decision.remaining, 97);

    // "warm" was evicted, so it starts fresh.
    let decision = ledger.check_and_consume_at(&warm, PolicyScope::Read, t(31));
    assert_eq!(decision.remaining, 99);
}

#[test]
fn sweeper_runs_on_demand() {
    let ledger = ledger();
    for i in 0..5 {
        let caller = Principal::User(format!("u{i}"));
        ledger.check_and_consume_at(&caller, PolicyScope::Read, t(0));
    }

    let sweeper = IdleSweeper::new(ledger.clone(), SweeperConfig::default());
    // The default threshold is 2 windows; the ledger's clock is the system
    // clock, so counters anchored at the epoch are long idle.
    assert_eq!(sweeper.sweep_once(), 5);
    assert!(sweeper.ledger().is_empty());
}

#[cfg(feature = "async")]
mod periodic {
    use super::*;

    #[tokio::test]
    async fn background_sweeper_reclaims_idle_counters() {
        let ledger = ledger();
        // Counters anchored at the epoch are idle relative to the system
        // clock the ledger reads.
        ledger.check_and_consume_at(&Principal::User("u".into()), PolicyScope::Read, t(0));
        assert_eq!(ledger.key_count(), 1);

        let config = SweeperConfig::new(Duration::from_millis(20)).unwrap();
        let handle = IdleSweeper::new(ledger.clone(), config).start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(ledger.key_count(), 0);
    }
}
