//! Auto-sell trigger on the operator wallet's token accounts

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::task_set::TaskSet;
use crate::domain::execution::TransactionSubmitter;
use crate::infrastructure::blockchain::chain_client::decode_token_account;
use crate::infrastructure::blockchain::subscriptions::{AccountEvent, AccountEventHandler};

pub struct WalletWatcher {
    quote_account: Pubkey,
    submitter: Arc<TransactionSubmitter>,
    tasks: Arc<TaskSet>,
}

impl WalletWatcher {
    pub fn new(quote_account: Pubkey, submitter: Arc<TransactionSubmitter>, tasks: Arc<TaskSet>) -> Self {
        Self {
            quote_account,
            submitter,
            tasks,
        }
    }
}

#[async_trait]
impl AccountEventHandler for WalletWatcher {
    async fn on_account_change(&self, event: AccountEvent) {
        if event.key == self.quote_account {
            return;
        }

        let token = match decode_token_account(&event.data) {
            Ok(token) => token,
            Err(e) => {
                warn!(account = %event.key, "Failed to decode token account: {}", e);
                return;
            }
        };

        debug!(mint = %token.mint, amount = token.amount, "Wallet token account changed");
        let submitter = self.submitter.clone();
        self.tasks
            .spawn("sell", async move {
                submitter.sell(token.mint, token.amount).await;
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{SubmitterSettings, TransactionBuilder};
    use crate::domain::pool::{MarketCache, TokenAccountRecord};
    use crate::infrastructure::blockchain::chain_client::mock::MockChainClient;
    use crate::infrastructure::blockchain::swap_instruction::test_pool_keys;
    use crate::shared::types::WSOL_MINT;
    use solana_sdk::program_pack::Pack;
    use solana_sdk::signature::Keypair;
    use std::time::Duration;

    fn token_account_data(mint: Pubkey, amount: u64) -> Vec<u8> {
        let account = spl_token::state::Account {
            mint,
            owner: Pubkey::new_unique(),
            amount,
            state: spl_token::state::AccountState::Initialized,
            ..Default::default()
        };
        let mut data = vec![0u8; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(account, &mut data).unwrap();
        data
    }

    fn setup() -> (WalletWatcher, Arc<MockChainClient>, Arc<TaskSet>, Pubkey, Pubkey) {
        let client = Arc::new(MockChainClient::new());
        let cache = Arc::new(MarketCache::new());
        let mint = Pubkey::new_unique();
        cache.put(mint, TokenAccountRecord::new(mint, Pubkey::new_unique()));
        cache.enrich(&mint, test_pool_keys(mint, WSOL_MINT));

        let quote_account = Pubkey::new_unique();
        let submitter = Arc::new(TransactionSubmitter::new(
            client.clone(),
            cache,
            TransactionBuilder::new(Arc::new(Keypair::new()), 1, 1),
            quote_account,
            SubmitterSettings {
                quote_amount: 1,
                buy_confirmation_timeout: Duration::from_millis(100),
                max_sell_retries: 2,
                sell_retry_backoff: Duration::from_millis(1),
                auto_sell_delay: Duration::ZERO,
                paper_trade: false,
                network: "devnet".to_string(),
            },
        ));
        let tasks = Arc::new(TaskSet::new(4));
        let watcher = WalletWatcher::new(quote_account, submitter, tasks.clone());
        (watcher, client, tasks, quote_account, mint)
    }

    #[tokio::test]
    async fn test_token_account_change_triggers_sell() {
        let (watcher, client, tasks, _, mint) = setup();

        watcher
            .on_account_change(AccountEvent {
                key: Pubkey::new_unique(),
                data: token_account_data(mint, 1_000),
            })
            .await;
        tasks.drain().await;

        assert_eq!(client.sends(), 1);
    }

    #[tokio::test]
    async fn test_quote_account_ignored() {
        let (watcher, client, tasks, quote_account, _) = setup();

        watcher
            .on_account_change(AccountEvent {
                key: quote_account,
                data: token_account_data(WSOL_MINT, 5_000),
            })
            .await;
        tasks.drain().await;

        assert_eq!(client.total_calls(), 0);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_zero_balance_makes_no_calls() {
        let (watcher, client, tasks, _, mint) = setup();

        watcher
            .on_account_change(AccountEvent {
                key: Pubkey::new_unique(),
                data: token_account_data(mint, 0),
            })
            .await;
        tasks.drain().await;

        assert_eq!(client.total_calls(), 0);
    }
}
