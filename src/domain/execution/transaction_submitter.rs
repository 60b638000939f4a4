//! Buy and sell submission
//!
//! A buy is a single attempt whose confirmation races a fixed timeout. A sell
//! retries with a short backoff until it confirms or the retry ceiling is hit:
//!
//! `Pending -> Attempting -> Confirmed | RetryWait -> Attempting | ExhaustedRetries`
//!
//! Neither path returns an error. Failures are logged and reported through
//! [`BuyOutcome`] / [`SellOutcome`].

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use spl_associated_token_account::get_associated_token_address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::execution::transaction_builder::TransactionBuilder;
use crate::domain::pool::{DiscoveredPool, MarketCache, TokenAccountRecord};
use crate::infrastructure::blockchain::chain_client::ChainClient;
use crate::infrastructure::blockchain::raydium_structures::{
    decode_market_state, MarketMeta, PoolKeys,
};
use crate::shared::errors::{ChainError, ExecutionError};
use crate::shared::utils::{dexscreener_maker_url, solscan_url};

#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    /// Raw quote units spent per buy
    pub quote_amount: u64,
    pub buy_confirmation_timeout: Duration,
    pub max_sell_retries: u32,
    pub sell_retry_backoff: Duration,
    pub auto_sell_delay: Duration,
    pub paper_trade: bool,
    /// Cluster name used in explorer links
    pub network: String,
}

/// One signed and submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAttempt {
    pub signature: Signature,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyOutcome {
    Confirmed(Signature),
    /// Confirmation did not arrive in time. The transaction may still land.
    TimedOut(Signature),
    Failed(String),
    PaperTrade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SellOutcome {
    Confirmed { signature: Signature, attempts: u32 },
    ExhaustedRetries { attempts: u32 },
    ZeroAmount,
    NoTokenAccount,
    NoPoolKeys,
    PaperTrade,
}

pub struct TransactionSubmitter {
    client: Arc<dyn ChainClient>,
    cache: Arc<MarketCache>,
    builder: TransactionBuilder,
    quote_account: Pubkey,
    settings: SubmitterSettings,
    sells_in_flight: Mutex<HashMap<Pubkey, usize>>,
}

/// Counts a running sell for its mint until dropped
struct InFlightSell<'a> {
    sells: &'a Mutex<HashMap<Pubkey, usize>>,
    mint: Pubkey,
}

impl Drop for InFlightSell<'_> {
    fn drop(&mut self) {
        let mut sells = self.sells.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = sells.get_mut(&self.mint) {
            *count -= 1;
            if *count == 0 {
                sells.remove(&self.mint);
            }
        }
    }
}

impl TransactionSubmitter {
    pub fn new(
        client: Arc<dyn ChainClient>,
        cache: Arc<MarketCache>,
        builder: TransactionBuilder,
        quote_account: Pubkey,
        settings: SubmitterSettings,
    ) -> Self {
        Self {
            client,
            cache,
            builder,
            quote_account,
            settings,
            sells_in_flight: Mutex::new(HashMap::new()),
        }
    }

    fn sells_in_flight(&self) -> MutexGuard<'_, HashMap<Pubkey, usize>> {
        self.sells_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Buy `quote_amount` worth of the pool's base token. At most one submission.
    pub async fn buy(&self, pool: &DiscoveredPool) -> BuyOutcome {
        let mint = pool.state.base_mint();

        if self.settings.paper_trade {
            info!(%mint, "PAPER BUY {}", pool.id);
            return BuyOutcome::PaperTrade;
        }

        match self.try_buy(pool).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%mint, "Failed to buy token: {}", e);
                BuyOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_buy(&self, pool: &DiscoveredPool) -> Result<BuyOutcome, ExecutionError> {
        let mint = pool.state.base_mint();
        let record = self.token_account_for_buy(pool).await?;
        let market = record
            .market
            .ok_or(ExecutionError::MissingMarket(mint))?;

        let pool_keys = PoolKeys::from_states(pool.id, &pool.state, &market)?;
        self.cache.enrich(&mint, pool_keys.clone());

        let blockhash = self.client.get_latest_blockhash().await?;
        let tx = self.builder.build_buy(
            &pool_keys,
            &self.quote_account,
            &record.associated_address,
            self.settings.quote_amount,
            blockhash.blockhash,
        )?;
        let signature = self.client.send_transaction(&tx).await?;
        let attempt = TransactionAttempt {
            signature,
            blockhash: blockhash.blockhash,
            last_valid_block_height: blockhash.last_valid_block_height,
            retry_count: 0,
        };
        info!(%mint, %signature, "Sent buy transaction");

        let timeout = self.settings.buy_confirmation_timeout;
        let confirmation = self
            .client
            .confirm_transaction(&attempt.signature, attempt.last_valid_block_height);

        // The losing confirmation future is dropped, so a late result is never reported
        match tokio::time::timeout(timeout, confirmation).await {
            Ok(Ok(())) => {
                info!(
                    %mint,
                    %signature,
                    "✅ Confirmed buy tx: {}",
                    solscan_url(&signature, &self.settings.network)
                );
                Ok(BuyOutcome::Confirmed(signature))
            }
            Ok(Err(e)) => {
                error!(%mint, %signature, "Error confirming buy tx: {}", e);
                Ok(BuyOutcome::Failed(e.to_string()))
            }
            Err(_) => {
                warn!(
                    %mint,
                    %signature,
                    "⏰ Buy confirmation timed out after {} ms",
                    timeout.as_millis()
                );
                Ok(BuyOutcome::TimedOut(signature))
            }
        }
    }

    /// Record for the pool's base mint, fetching its market when it was not seen yet
    async fn token_account_for_buy(
        &self,
        pool: &DiscoveredPool,
    ) -> Result<TokenAccountRecord, ExecutionError> {
        let mint = pool.state.base_mint();
        if let Some(record) = self.cache.get(&mint) {
            if record.market.is_some() {
                return Ok(record);
            }
        }

        let market_id = pool.state.market_id();
        let data = self
            .client
            .get_account_data(&market_id)
            .await?
            .ok_or(ChainError::AccountNotFound(market_id))?;
        let market = MarketMeta::from(&decode_market_state(&data)?);

        let ata = get_associated_token_address(&self.builder.payer(), &mint);
        if !self
            .cache
            .put(mint, TokenAccountRecord::new(mint, ata).with_market(market))
        {
            self.cache.enrich_market(&mint, market);
        }

        self.cache
            .get(&mint)
            .ok_or(ExecutionError::MissingMarket(mint))
    }

    /// Sell `amount` raw units of `mint` back to the quote token.
    pub async fn sell(&self, mint: Pubkey, amount: u64) -> SellOutcome {
        let Some(record) = self.cache.get(&mint) else {
            warn!(%mint, "No token account record, skipping sell");
            return SellOutcome::NoTokenAccount;
        };
        let Some(pool_keys) = record.pool_keys.clone() else {
            warn!(%mint, "No pool keys found, skipping sell");
            return SellOutcome::NoPoolKeys;
        };
        if amount == 0 {
            info!(%mint, "Empty balance, nothing to sell");
            return SellOutcome::ZeroAmount;
        }

        let _in_flight = self.track_sell(mint);

        if self.settings.paper_trade {
            info!(%mint, amount, "PAPER SELL {}", pool_keys.id);
            return SellOutcome::PaperTrade;
        }

        if !self.settings.auto_sell_delay.is_zero() {
            tokio::time::sleep(self.settings.auto_sell_delay).await;
        }

        let max_attempts = self.settings.max_sell_retries.max(1);
        let mut retry_count = 0u32;
        loop {
            match self.try_sell(&pool_keys, &record, amount, retry_count).await {
                Ok(attempt) => {
                    info!(
                        %mint,
                        signature = %attempt.signature,
                        "✅ Confirmed sell tx: {} | {}",
                        solscan_url(&attempt.signature, &self.settings.network),
                        dexscreener_maker_url(&mint, &self.builder.payer())
                    );
                    return SellOutcome::Confirmed {
                        signature: attempt.signature,
                        attempts: retry_count + 1,
                    };
                }
                Err(e) => {
                    retry_count += 1;
                    warn!(%mint, attempt = retry_count, "Sell attempt failed: {}", e);
                    if retry_count >= max_attempts {
                        error!(%mint, "Failed to sell token after {} attempts", retry_count);
                        return SellOutcome::ExhaustedRetries {
                            attempts: retry_count,
                        };
                    }
                    tokio::time::sleep(self.settings.sell_retry_backoff).await;
                }
            }
        }
    }

    async fn try_sell(
        &self,
        pool_keys: &PoolKeys,
        record: &TokenAccountRecord,
        amount: u64,
        retry_count: u32,
    ) -> Result<TransactionAttempt, ExecutionError> {
        let blockhash = self.client.get_latest_blockhash().await?;
        let tx = self.builder.build_sell(
            pool_keys,
            &record.associated_address,
            &self.quote_account,
            amount,
            blockhash.blockhash,
        )?;
        let signature = self.client.send_transaction(&tx).await?;
        info!(mint = %record.mint, %signature, retry_count, "Sent sell transaction");

        let attempt = TransactionAttempt {
            signature,
            blockhash: blockhash.blockhash,
            last_valid_block_height: blockhash.last_valid_block_height,
            retry_count,
        };
        self.client
            .confirm_transaction(&attempt.signature, attempt.last_valid_block_height)
            .await?;
        Ok(attempt)
    }

    fn track_sell(&self, mint: Pubkey) -> InFlightSell<'_> {
        let mut sells = self.sells_in_flight();
        let count = sells.entry(mint).or_insert(0);
        if *count > 0 {
            warn!(%mint, "Another sell for this mint is still in flight");
        }
        *count += 1;
        InFlightSell {
            sells: &self.sells_in_flight,
            mint,
        }
    }
}
