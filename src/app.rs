// src/app.rs
use anyhow::Result;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_sdk::native_token::lamports_to_sol;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::application::{startup_watchdog, Reporter, Sniper, TaskSet, WalletWatcher};
use crate::domain::execution::{SubmitterSettings, TransactionBuilder, TransactionSubmitter};
use crate::domain::pool::{MarketCache, MarketWatcher, PoolWatcher, TokenAccountRecord};
use crate::domain::trading::{GateSettings, SnipeList, SnipeListRefresher, TradeGate};
use crate::infrastructure::blockchain::chain_client::{
    ChainClient, RpcChainClient, WalletTokenAccount,
};
use crate::infrastructure::blockchain::subscriptions::{
    market_subscription, pool_subscription, run_subscription, wallet_subscription,
};
use crate::shared::config::Config;
use crate::shared::errors::{ChainError, StartupError};
use crate::shared::types::{Amount, QuoteToken};
use crate::shared::utils::unix_now;

fn log_config(config: &Config, wallet: &Pubkey) {
    info!("🚀 Starting Raydium sniper");
    info!("Wallet: {}", wallet);
    info!("RPC: {} | WS: {}", config.rpc_endpoint, config.rpc_websocket_endpoint);
    info!("Commitment: {}", config.commitment_level);
    info!("Quote: {} {}", config.quote_amount, config.quote_mint);
    info!("Min pool size: {} {}", config.min_pool_size, config.quote_mint);
    info!("Max pool age: {}s", config.max_pool_age_seconds);
    info!("Check mint renounced: {}", config.check_if_mint_is_renounced);
    info!("Snipe list: {}", config.use_snipe_list);
    info!(
        "Auto sell: {} (delay {} ms, max retries {})",
        config.auto_sell, config.auto_sell_delay, config.max_sell_retries
    );
    if config.paper_trade {
        info!("📝 Paper trading enabled, no transactions will be sent");
    }
}

/// The wallet's quote-token account and its balance
fn find_quote_account(
    token_accounts: &[WalletTokenAccount],
    quote: QuoteToken,
    wallet: Pubkey,
) -> Result<(Pubkey, Amount), StartupError> {
    token_accounts
        .iter()
        .find(|account| account.mint == quote.mint())
        .map(|account| (account.address, Amount::new(account.amount, quote.decimals())))
        .ok_or(StartupError::MissingQuoteTokenAccount {
            symbol: quote.symbol(),
            wallet,
        })
}

/// Build the trading context and run every stream until one of them stops.
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let keypair = Arc::new(config.keypair()?);
    let wallet = keypair.pubkey();
    let quote = config.quote_token()?;
    let commitment = config.commitment()?;
    let quote_amount = config.quote_amount_raw(quote)?;
    let min_pool_size = config.min_pool_size_raw(quote)?;

    log_config(&config, &wallet);

    let client = Arc::new(RpcChainClient::new(config.rpc_endpoint.clone(), commitment));
    let balance = client.get_balance(&wallet).await.map_err(StartupError::from)?;
    info!("Wallet SOL balance: {}", lamports_to_sol(balance));

    // Existing token accounts are cached so sells work for tokens bought earlier
    let cache = Arc::new(MarketCache::new());
    let token_accounts = client
        .get_wallet_token_accounts(&wallet)
        .await
        .map_err(StartupError::from)?;
    for account in &token_accounts {
        cache.put(account.mint, TokenAccountRecord::new(account.mint, account.address));
    }
    let (quote_account, quote_balance) = find_quote_account(&token_accounts, quote, wallet)?;
    info!("{} token account: {} (balance {})", quote, quote_account, quote_balance);

    let snipe_list = Arc::new(SnipeList::new());
    let snipe_list_path = PathBuf::from(&config.snipe_list_path);
    if config.use_snipe_list {
        snipe_list.reload(&snipe_list_path).await;
    }

    let tasks = Arc::new(TaskSet::new(config.max_concurrent_tasks));
    let gate = Arc::new(TradeGate::new(
        GateSettings {
            max_pool_age_seconds: config.max_pool_age_seconds,
            use_snipe_list: config.use_snipe_list,
            min_pool_size: min_pool_size.value,
            check_mint_renounced: config.check_if_mint_is_renounced,
        },
        snipe_list.clone(),
        client.clone(),
    ));
    let submitter = Arc::new(TransactionSubmitter::new(
        client.clone(),
        cache.clone(),
        TransactionBuilder::new(
            keypair.clone(),
            config.compute_unit_price,
            config.compute_unit_limit,
        ),
        quote_account,
        SubmitterSettings {
            quote_amount: quote_amount.value,
            buy_confirmation_timeout: Duration::from_millis(config.buy_confirmation_timeout_ms),
            max_sell_retries: config.max_sell_retries,
            sell_retry_backoff: Duration::from_millis(config.sell_retry_backoff_ms),
            auto_sell_delay: Duration::from_millis(config.auto_sell_delay),
            paper_trade: config.paper_trade,
            network: config.network.clone(),
        },
    ));

    let sniper = Arc::new(Sniper {
        gate,
        submitter: submitter.clone(),
        tasks: tasks.clone(),
    });
    let pool_watcher = Arc::new(PoolWatcher::new(unix_now(), sniper.clone()));
    let market_watcher = MarketWatcher::new(wallet, cache.clone());
    let wallet_watcher = WalletWatcher::new(quote_account, submitter, tasks.clone());
    let reporter = Reporter::new(
        pool_watcher.clone(),
        Duration::from_millis(config.report_interval_ms),
    );
    let refresher = SnipeListRefresher::new(
        snipe_list,
        snipe_list_path,
        Duration::from_millis(config.snipe_list_refresh_interval),
    );
    let watchdog = async {
        startup_watchdog(
            pool_watcher.clone(),
            Duration::from_millis(config.startup_watchdog_ms),
        )
        .await?;
        std::future::pending::<Result<(), StartupError>>().await
    };

    let pubsub = PubsubClient::new(&config.rpc_websocket_endpoint)
        .await
        .map_err(|e| StartupError::from(ChainError::Subscription(e.to_string())))?;

    info!("👀 Listening for new pools ({} cached token accounts)", cache.len());

    let result: Result<()> = tokio::select! {
        res = run_subscription(&pubsub, pool_subscription(&quote.mint()), commitment, pool_watcher.as_ref()) => {
            res.map_err(Into::into)
        }
        res = run_subscription(&pubsub, market_subscription(&quote.mint()), commitment, &market_watcher) => {
            res.map_err(Into::into)
        }
        res = run_subscription(&pubsub, wallet_subscription(&wallet), commitment, &wallet_watcher), if config.auto_sell => {
            res.map_err(Into::into)
        }
        res = watchdog => res.map_err(Into::into),
        _ = reporter.run() => Ok(()),
        _ = refresher.run(), if config.use_snipe_list => Ok(()),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down, waiting for {} running tasks", tasks.len());
            tasks.drain().await;
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("❌ Stopping: {}", e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::WSOL_MINT;

    #[test]
    fn test_find_quote_account_reports_balance() {
        let wallet = Pubkey::new_unique();
        let wsol_account = Pubkey::new_unique();
        let accounts = vec![
            WalletTokenAccount {
                address: Pubkey::new_unique(),
                mint: Pubkey::new_unique(),
                amount: 7,
            },
            WalletTokenAccount {
                address: wsol_account,
                mint: WSOL_MINT,
                amount: 1_250_000_000,
            },
        ];

        let (address, balance) = find_quote_account(&accounts, QuoteToken::Wsol, wallet).unwrap();
        assert_eq!(address, wsol_account);
        assert_eq!(balance.value, 1_250_000_000);
        assert_eq!(balance.to_string(), "1.250000000");

        assert!(matches!(
            find_quote_account(&accounts, QuoteToken::Usdc, wallet),
            Err(StartupError::MissingQuoteTokenAccount { symbol: "USDC", .. })
        ));
    }
}
