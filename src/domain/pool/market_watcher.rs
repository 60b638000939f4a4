//! Pre-populates the market cache from the OpenBook market stream
//!
//! Markets are usually created before their pool, so by the time a pool shows
//! up the buy path can skip the market fetch.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::pool::{MarketCache, TokenAccountRecord};
use crate::infrastructure::blockchain::raydium_structures::{decode_market_state, MarketMeta};
use crate::infrastructure::blockchain::subscriptions::{AccountEvent, AccountEventHandler};
use crate::shared::errors::DecodeError;

pub struct MarketWatcher {
    wallet: Pubkey,
    cache: Arc<MarketCache>,
}

impl MarketWatcher {
    pub fn new(wallet: Pubkey, cache: Arc<MarketCache>) -> Self {
        Self { wallet, cache }
    }

    /// Store a record for the market's base mint unless one exists. Returns `true` when stored.
    pub fn observe(&self, event: &AccountEvent) -> Result<bool, DecodeError> {
        let market = decode_market_state(&event.data)?;
        let mint = market.base_mint();
        if self.cache.contains(&mint) {
            return Ok(false);
        }

        let ata = get_associated_token_address(&self.wallet, &mint);
        Ok(self.cache.put(
            mint,
            TokenAccountRecord::new(mint, ata).with_market(MarketMeta::from(&market)),
        ))
    }
}

#[async_trait]
impl AccountEventHandler for MarketWatcher {
    async fn on_account_change(&self, event: AccountEvent) {
        match self.observe(&event) {
            Ok(true) => debug!(market = %event.key, "Cached market"),
            Ok(false) => {}
            Err(e) => error!(market = %event.key, "Failed to process market: {}", e),
        }
    }
}
