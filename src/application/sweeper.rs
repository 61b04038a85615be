//! Idle-counter reclamation.
//!
//! Counters are created lazily per (principal, scope) key and never
//! destroyed by admission itself, so a flood of distinct anonymous
//! addresses would otherwise grow the store without bound. The sweeper
//! periodically removes counters whose window lapsed long enough ago that
//! dropping them cannot change any future decision.

use crate::application::ledger::QuotaLedger;
use crate::application::ports::CounterStore;
use crate::domain::counter::WindowCounter;
use crate::domain::principal::QuotaKey;
use std::time::Duration;

#[cfg(feature = "async")]
use tokio::time::interval;

/// Error returned when sweeper configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweeperConfigError {
    /// Sweep interval duration must be greater than zero
    ZeroInterval,
    /// Idle threshold must be at least one window
    ZeroIdleWindows,
}

impl std::fmt::Display for SweeperConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweeperConfigError::ZeroInterval => {
                write!(f, "sweep interval must be greater than 0")
            }
            SweeperConfigError::ZeroIdleWindows => {
                write!(f, "idle threshold must be at least one window")
            }
        }
    }
}

impl std::error::Error for SweeperConfigError {}

/// Configuration for idle-counter sweeping.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: Duration,
    /// How many windows a counter must sit idle before reclamation
    pub idle_windows: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            idle_windows: 2,
        }
    }
}

impl SweeperConfig {
    /// Create a sweeper config with the specified interval.
    ///
    /// # Errors
    /// Returns [`SweeperConfigError::ZeroInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self, SweeperConfigError> {
        if interval.is_zero() {
            return Err(SweeperConfigError::ZeroInterval);
        }
        Ok(Self {
            interval,
            idle_windows: 2,
        })
    }

    /// Set the idle threshold, in windows.
    ///
    /// # Errors
    /// Returns [`SweeperConfigError::ZeroIdleWindows`] for zero — a counter
    /// whose window has not fully lapsed still holds live quota state.
    pub fn with_idle_windows(mut self, idle_windows: u32) -> Result<Self, SweeperConfigError> {
        if idle_windows == 0 {
            return Err(SweeperConfigError::ZeroIdleWindows);
        }
        self.idle_windows = idle_windows;
        Ok(self)
    }
}

/// Reclaims idle counters from a ledger, on demand or on a schedule.
pub struct IdleSweeper<S>
where
    S: CounterStore<QuotaKey, WindowCounter> + Clone,
{
    ledger: QuotaLedger<S>,
    config: SweeperConfig,
}

impl<S> IdleSweeper<S>
where
    S: CounterStore<QuotaKey, WindowCounter> + Clone,
{
    /// Create a sweeper over a ledger.
    pub fn new(ledger: QuotaLedger<S>, config: SweeperConfig) -> Self {
        Self { ledger, config }
    }

    /// Run one sweep now. Returns the number of counters removed.
    pub fn sweep_once(&self) -> usize {
        self.ledger.sweep_idle(self.config.idle_windows)
    }

    /// Start sweeping periodically on the current tokio runtime.
    ///
    /// The task runs until aborted via the returned handle; dropping the
    /// handle detaches the task.
    #[cfg(feature = "async")]
    pub fn start(self) -> tokio::task::JoinHandle<()>
    where
        S: 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.interval);

            loop {
                ticker.tick().await;
                self.sweep_once();
            }
        })
    }

    /// Get the sweeper configuration.
    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Get a reference to the ledger.
    pub fn ledger(&self) -> &QuotaLedger<S> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics::Metrics;
    use crate::application::table::PolicyTable;
    use crate::domain::principal::Principal;
    use crate::domain::scope::PolicyScope;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStore;
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    fn ledger_with_clock() -> (
        QuotaLedger<Arc<ShardedStore<QuotaKey, WindowCounter>>>,
        Arc<MockClock>,
    ) {
        let clock = Arc::new(MockClock::new(UNIX_EPOCH + Duration::from_secs(0)));
        let ledger = QuotaLedger::new(
            Arc::new(ShardedStore::new()),
            clock.clone(),
            Arc::new(PolicyTable::default()),
            Metrics::new(),
        );
        (ledger, clock)
    }

    #[test]
    fn test_sweep_once_removes_idle() {
        let (ledger, clock) = ledger_with_clock();
        ledger.check_and_consume(&Principal::User("u1".into()), PolicyScope::Read);
        ledger.check_and_consume(&Principal::User("u2".into()), PolicyScope::Read);

        let sweeper = IdleSweeper::new(ledger, SweeperConfig::default());
        assert_eq!(sweeper.sweep_once(), 0);

        // Two read windows later both counters are reclaimable.
        clock.advance(Duration::from_secs(120));
        assert_eq!(sweeper.sweep_once(), 2);
        assert!(sweeper.ledger().is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            SweeperConfig::new(Duration::ZERO),
            Err(SweeperConfigError::ZeroInterval)
        ));
        assert!(matches!(
            SweeperConfig::default().with_idle_windows(0),
            Err(SweeperConfigError::ZeroIdleWindows)
        ));

        let config = SweeperConfig::new(Duration::from_secs(30))
            .unwrap()
            .with_idle_windows(5)
            .unwrap();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.idle_windows, 5);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_periodic_sweeping() {
        let clock = Arc::new(MockClock::new(std::time::SystemTime::now()));
        let ledger = QuotaLedger::new(
            Arc::new(ShardedStore::new()),
            clock.clone(),
            Arc::new(PolicyTable::default()),
            Metrics::new(),
        );
        ledger.check_and_consume(&Principal::User("u".into()), PolicyScope::Read);
        assert_eq!(ledger.key_count(), 1);

        clock.advance(Duration::from_secs(300));

        let config = SweeperConfig::new(Duration::from_millis(20)).unwrap();
        let handle = IdleSweeper::new(ledger.clone(), config).start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(ledger.key_count(), 0);
    }
}
