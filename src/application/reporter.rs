//! Periodic counters and the startup watchdog

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::domain::pool::PoolWatcher;
use crate::shared::errors::StartupError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSnapshot {
    pub elapsed_seconds: u64,
    pub events_per_second: f64,
    pub tracked_pools: usize,
}

impl ReportSnapshot {
    pub fn new(events: u64, tracked_pools: usize, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs();
        let events_per_second = if elapsed.as_secs_f64() > 0.0 {
            events as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Self {
            elapsed_seconds,
            events_per_second,
            tracked_pools,
        }
    }
}

pub struct Reporter {
    watcher: Arc<PoolWatcher>,
    interval: Duration,
    started: Instant,
}

impl Reporter {
    pub fn new(watcher: Arc<PoolWatcher>, interval: Duration) -> Self {
        Self {
            watcher,
            interval,
            started: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> ReportSnapshot {
        ReportSnapshot::new(
            self.watcher.events_received(),
            self.watcher.tracked_pools(),
            self.started.elapsed(),
        )
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = self.snapshot();
            info!(
                "📊 {}s elapsed | {:.1} events/s | {} pools tracked",
                snapshot.elapsed_seconds, snapshot.events_per_second, snapshot.tracked_pools
            );
        }
    }
}

/// Fail when the pool stream has delivered nothing once `window` has passed.
pub async fn startup_watchdog(watcher: Arc<PoolWatcher>, window: Duration) -> Result<(), StartupError> {
    tokio::time::sleep(window).await;
    if watcher.events_received() == 0 {
        return Err(StartupError::NoEventsReceived(window.as_millis() as u64));
    }
    info!("Pool stream is live ({} events so far)", watcher.events_received());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::{DiscoveredPool, PoolHandler};
    use crate::infrastructure::blockchain::subscriptions::AccountEvent;
    use async_trait::async_trait;
    use solana_sdk::pubkey::Pubkey;

    struct Ignore;

    #[async_trait]
    impl PoolHandler for Ignore {
        async fn on_new_pool(&self, _pool: DiscoveredPool) {}
    }

    #[test]
    fn test_snapshot_rates() {
        let snapshot = ReportSnapshot::new(50, 7, Duration::from_secs(10));
        assert_eq!(snapshot.elapsed_seconds, 10);
        assert_eq!(snapshot.events_per_second, 5.0);
        assert_eq!(snapshot.tracked_pools, 7);

        assert_eq!(ReportSnapshot::new(3, 0, Duration::ZERO).events_per_second, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_fails_without_events() {
        let watcher = Arc::new(PoolWatcher::new(0, Arc::new(Ignore)));
        let result = startup_watchdog(watcher, Duration::from_secs(30)).await;
        assert!(matches!(result, Err(StartupError::NoEventsReceived(30_000))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_passes_after_events() {
        let watcher = Arc::new(PoolWatcher::new(0, Arc::new(Ignore)));
        watcher.observe(
            &AccountEvent {
                key: Pubkey::new_unique(),
                data: vec![],
            },
            1,
        );
        assert!(startup_watchdog(watcher, Duration::from_secs(30)).await.is_ok());
    }
}
