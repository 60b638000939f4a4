//! Pool domain - discovery and per-mint trading metadata

mod market_cache;
mod market_watcher;
mod pool_watcher;

pub use market_cache::{MarketCache, TokenAccountRecord};
pub use market_watcher::MarketWatcher;
pub use pool_watcher::{PoolObservation, PoolWatcher};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::infrastructure::blockchain::raydium_structures::LiquidityStateV4;

/// Classification of a pool key. A key leaves `Unknown` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Unknown,
    Recent,
    Stale,
}

/// Dedup entry kept for every pool key ever seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRecord {
    pub key: Pubkey,
    pub open_timestamp: u64,
    pub discovered_at: u64,
    /// Notifications received after the first one
    pub swap_count: u64,
    pub state: PoolState,
}

/// Newly discovered pool handed to the trading path
#[derive(Debug, Clone)]
pub struct DiscoveredPool {
    pub id: Pubkey,
    pub state: LiquidityStateV4,
    pub age_seconds: u64,
}

/// Receives every Recent pool exactly once
#[async_trait]
pub trait PoolHandler: Send + Sync {
    async fn on_new_pool(&self, pool: DiscoveredPool);
}
