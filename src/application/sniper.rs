//! Trading context built once at startup
//!
//! [`Sniper`] owns everything a pool handler needs. The pool watcher hands it
//! each new pool; the gate check and the buy run as a detached task.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::application::task_set::TaskSet;
use crate::domain::execution::{BuyOutcome, TransactionSubmitter};
use crate::domain::pool::{DiscoveredPool, PoolHandler};
use crate::domain::trading::TradeGate;

pub struct Sniper {
    pub gate: Arc<TradeGate>,
    pub submitter: Arc<TransactionSubmitter>,
    pub tasks: Arc<TaskSet>,
}

impl Sniper {
    /// Gate check then buy. `None` when the gate skipped the pool.
    pub async fn process_pool(
        gate: &TradeGate,
        submitter: &TransactionSubmitter,
        pool: &DiscoveredPool,
    ) -> Option<BuyOutcome> {
        let decision = gate.should_buy(&pool.state).await;
        if !decision.proceed {
            return None;
        }

        info!(
            pool = %pool.id,
            mint = %pool.state.base_mint(),
            "Processing pool with {} raw quote units swapped in",
            pool.state.swap_quote_in_amount()
        );
        Some(submitter.buy(pool).await)
    }
}

#[async_trait]
impl PoolHandler for Sniper {
    async fn on_new_pool(&self, pool: DiscoveredPool) {
        let gate = self.gate.clone();
        let submitter = self.submitter.clone();
        self.tasks
            .spawn("buy", async move {
                Sniper::process_pool(&gate, &submitter, &pool).await;
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{SubmitterSettings, TransactionBuilder};
    use crate::domain::pool::{MarketCache, PoolWatcher};
    use crate::domain::trading::{GateSettings, SnipeList};
    use crate::infrastructure::blockchain::chain_client::mock::MockChainClient;
    use crate::infrastructure::blockchain::raydium_structures::test_support::pool_state;
    use crate::infrastructure::blockchain::subscriptions::{AccountEvent, AccountEventHandler};
    use crate::shared::types::WSOL_MINT;
    use crate::shared::utils::unix_now;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Keypair;
    use std::collections::HashSet;
    use std::time::Duration;

    fn sniper(client: Arc<MockChainClient>, gate: GateSettings, snipe_list: Arc<SnipeList>) -> Sniper {
        let cache = Arc::new(MarketCache::new());
        let submitter = Arc::new(TransactionSubmitter::new(
            client.clone(),
            cache,
            TransactionBuilder::new(Arc::new(Keypair::new()), 1, 1),
            Pubkey::new_unique(),
            SubmitterSettings {
                quote_amount: 1_000,
                buy_confirmation_timeout: Duration::from_millis(100),
                max_sell_retries: 1,
                sell_retry_backoff: Duration::from_millis(1),
                auto_sell_delay: Duration::ZERO,
                paper_trade: true,
                network: "devnet".to_string(),
            },
        ));
        Sniper {
            gate: Arc::new(TradeGate::new(gate, snipe_list, client)),
            submitter,
            tasks: Arc::new(TaskSet::new(8)),
        }
    }

    fn open_gate() -> GateSettings {
        GateSettings {
            max_pool_age_seconds: 0,
            use_snipe_list: false,
            min_pool_size: 0,
            check_mint_renounced: false,
        }
    }

    #[tokio::test]
    async fn test_low_liquidity_pool_not_bought() {
        let client = Arc::new(MockChainClient::new());
        let sniper = sniper(
            client.clone(),
            GateSettings {
                min_pool_size: 5_000_000_000,
                ..open_gate()
            },
            Arc::new(SnipeList::new()),
        );

        let mut state = pool_state(Pubkey::new_unique(), WSOL_MINT, unix_now());
        state.swap_quote_in_amount = 1_000_000_000u128.to_le_bytes();
        let pool = DiscoveredPool {
            id: Pubkey::new_unique(),
            state,
            age_seconds: 0,
        };

        let outcome = Sniper::process_pool(&sniper.gate, &sniper.submitter, &pool).await;
        assert!(outcome.is_none());
        assert_eq!(client.sends(), 0);
    }

    #[tokio::test]
    async fn test_snipe_list_selects_mint() {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let client = Arc::new(MockChainClient::new());
        let sniper = sniper(
            client,
            GateSettings {
                use_snipe_list: true,
                ..open_gate()
            },
            Arc::new(SnipeList::from_mints(HashSet::from([mint_a]))),
        );

        let pool_for = |mint| DiscoveredPool {
            id: Pubkey::new_unique(),
            state: pool_state(mint, WSOL_MINT, unix_now()),
            age_seconds: 0,
        };

        let a = Sniper::process_pool(&sniper.gate, &sniper.submitter, &pool_for(mint_a)).await;
        let b = Sniper::process_pool(&sniper.gate, &sniper.submitter, &pool_for(mint_b)).await;
        assert_eq!(a, Some(BuyOutcome::PaperTrade));
        assert_eq!(b, None);
    }

    #[tokio::test]
    async fn test_watcher_to_sniper_runs_buy_once() {
        let client = Arc::new(MockChainClient::new());
        let sniper = Arc::new(sniper(client, open_gate(), Arc::new(SnipeList::new())));
        let start = unix_now() - 60;
        let watcher = PoolWatcher::new(start, sniper.clone());

        let state = pool_state(Pubkey::new_unique(), WSOL_MINT, start + 1);
        let event = AccountEvent {
            key: Pubkey::new_unique(),
            data: bytemuck::bytes_of(&state).to_vec(),
        };
        for _ in 0..3 {
            watcher.on_account_change(event.clone()).await;
        }
        assert!(sniper.tasks.len() <= 1);
        sniper.tasks.drain().await;
        assert_eq!(watcher.record(&event.key).unwrap().swap_count, 2);
    }
}
