//! New pool discovery with per-key deduplication
//!
//! Every pool notification goes through [`PoolWatcher::observe`]. The first
//! sighting of a key claims it inside a single critical section, so no other
//! notification for the same key can be classified as new, whatever the
//! interleaving of handlers. Later sightings only bump `swap_count`.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::domain::pool::{DiscoveredPool, PoolHandler, PoolRecord, PoolState};
use crate::infrastructure::blockchain::raydium_structures::decode_liquidity_state;
use crate::infrastructure::blockchain::subscriptions::{AccountEvent, AccountEventHandler};
use crate::shared::errors::DecodeError;
use crate::shared::utils::unix_now;

/// Result of classifying one notification
#[derive(Debug)]
pub enum PoolObservation {
    /// Key seen before
    Known,
    /// First sighting of a pool opened after the watcher started
    Recent(DiscoveredPool),
    /// First sighting of a pool that opened before the watcher started
    Stale,
    /// First sighting, but the data did not decode. The key is still recorded.
    Undecodable(DecodeError),
}

pub struct PoolWatcher {
    pools: Mutex<HashMap<Pubkey, PoolRecord>>,
    events: AtomicU64,
    start_timestamp: u64,
    handler: Arc<dyn PoolHandler>,
}

impl PoolWatcher {
    pub fn new(start_timestamp: u64, handler: Arc<dyn PoolHandler>) -> Self {
        Self {
            pools: Mutex::new(HashMap::new()),
            events: AtomicU64::new(0),
            start_timestamp,
            handler,
        }
    }

    fn pools(&self) -> MutexGuard<'_, HashMap<Pubkey, PoolRecord>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count, claim and classify a notification. Never suspends.
    pub fn observe(&self, event: &AccountEvent, now: u64) -> PoolObservation {
        self.events.fetch_add(1, Ordering::Relaxed);

        let mut pools = self.pools();
        let slot = match pools.entry(event.key) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().swap_count += 1;
                return PoolObservation::Known;
            }
            Entry::Vacant(slot) => slot,
        };

        match decode_liquidity_state(&event.data) {
            Ok(state) => {
                let open_timestamp = state.pool_open_time;
                let recent = open_timestamp > self.start_timestamp;
                slot.insert(PoolRecord {
                    key: event.key,
                    open_timestamp,
                    discovered_at: now,
                    swap_count: 0,
                    state: if recent { PoolState::Recent } else { PoolState::Stale },
                });

                if recent {
                    PoolObservation::Recent(DiscoveredPool {
                        id: event.key,
                        state,
                        age_seconds: now.saturating_sub(open_timestamp),
                    })
                } else {
                    PoolObservation::Stale
                }
            }
            Err(e) => {
                slot.insert(PoolRecord {
                    key: event.key,
                    open_timestamp: 0,
                    discovered_at: now,
                    swap_count: 0,
                    state: PoolState::Stale,
                });
                PoolObservation::Undecodable(e)
            }
        }
    }

    pub fn events_received(&self) -> u64 {
        self.events.load(Ordering::Relaxed)
    }

    pub fn tracked_pools(&self) -> usize {
        self.pools().len()
    }

    pub fn record(&self, key: &Pubkey) -> Option<PoolRecord> {
        self.pools().get(key).cloned()
    }

    pub fn state_of(&self, key: &Pubkey) -> PoolState {
        self.pools()
            .get(key)
            .map_or(PoolState::Unknown, |record| record.state)
    }
}

#[async_trait]
impl AccountEventHandler for PoolWatcher {
    async fn on_account_change(&self, event: AccountEvent) {
        match self.observe(&event, unix_now()) {
            PoolObservation::Recent(pool) => {
                info!(
                    "🆕 New pool {} for mint {} ({}s old)",
                    pool.id,
                    pool.state.base_mint(),
                    pool.age_seconds
                );
                self.handler.on_new_pool(pool).await;
            }
            PoolObservation::Undecodable(e) => {
                warn!(pool = %event.key, "Failed to decode pool: {}", e);
            }
            PoolObservation::Known | PoolObservation::Stale => {}
        }
    }
}
