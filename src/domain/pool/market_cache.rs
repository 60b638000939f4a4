//! Per-mint token account and market metadata
//!
//! Records are created once (market discovery, startup wallet scan or the buy
//! path) and afterwards only enriched, never replaced.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::infrastructure::blockchain::raydium_structures::{MarketMeta, PoolKeys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountRecord {
    pub mint: Pubkey,
    /// Associated token account of the operator wallet for `mint`
    pub associated_address: Pubkey,
    pub pool_keys: Option<PoolKeys>,
    pub market: Option<MarketMeta>,
}

impl TokenAccountRecord {
    pub fn new(mint: Pubkey, associated_address: Pubkey) -> Self {
        Self {
            mint,
            associated_address,
            pool_keys: None,
            market: None,
        }
    }

    pub fn with_market(mut self, market: MarketMeta) -> Self {
        self.market = Some(market);
        self
    }
}

#[derive(Default)]
pub struct MarketCache {
    records: Mutex<HashMap<Pubkey, TokenAccountRecord>>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never panic mid-update, so a poisoned map is still consistent
    fn records(&self) -> MutexGuard<'_, HashMap<Pubkey, TokenAccountRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, mint: &Pubkey) -> Option<TokenAccountRecord> {
        self.records().get(mint).cloned()
    }

    /// Insert if absent. Returns `true` when the record was stored.
    pub fn put(&self, mint: Pubkey, record: TokenAccountRecord) -> bool {
        let mut records = self.records();
        if records.contains_key(&mint) {
            return false;
        }
        records.insert(mint, record);
        true
    }

    /// Attach pool keys to an existing record. Returns `false` when the mint is unknown.
    pub fn enrich(&self, mint: &Pubkey, pool_keys: PoolKeys) -> bool {
        match self.records().get_mut(mint) {
            Some(record) => {
                record.pool_keys = Some(pool_keys);
                true
            }
            None => false,
        }
    }

    /// Attach market metadata to an existing record that has none yet
    pub fn enrich_market(&self, mint: &Pubkey, market: MarketMeta) -> bool {
        match self.records().get_mut(mint) {
            Some(record) if record.market.is_none() => {
                record.market = Some(market);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.records().contains_key(mint)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::swap_instruction::test_pool_keys;

    fn market() -> MarketMeta {
        MarketMeta {
            bids: Pubkey::new_unique(),
            asks: Pubkey::new_unique(),
            event_queue: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            vault_signer_nonce: 1,
        }
    }

    #[test]
    fn test_put_never_replaces() {
        let cache = MarketCache::new();
        let mint = Pubkey::new_unique();
        let first = TokenAccountRecord::new(mint, Pubkey::new_unique());
        let second = TokenAccountRecord::new(mint, Pubkey::new_unique());

        assert!(cache.put(mint, first.clone()));
        assert!(!cache.put(mint, second));
        assert_eq!(cache.get(&mint), Some(first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_enrich_existing_record() {
        let cache = MarketCache::new();
        let mint = Pubkey::new_unique();
        let keys = test_pool_keys(mint, Pubkey::new_unique());

        assert!(!cache.enrich(&mint, keys.clone()));
        cache.put(mint, TokenAccountRecord::new(mint, Pubkey::new_unique()));
        assert!(cache.enrich(&mint, keys.clone()));
        assert_eq!(cache.get(&mint).unwrap().pool_keys, Some(keys));
    }

    #[test]
    fn test_enrich_market_only_fills_missing_market() {
        let cache = MarketCache::new();
        let mint = Pubkey::new_unique();
        let first = market();

        cache.put(mint, TokenAccountRecord::new(mint, Pubkey::new_unique()));
        assert!(cache.enrich_market(&mint, first));
        assert!(!cache.enrich_market(&mint, market()));
        assert_eq!(cache.get(&mint).unwrap().market, Some(first));
        assert!(cache.contains(&mint));
        assert!(!cache.contains(&Pubkey::new_unique()));
    }
}
