//! Program account subscriptions over the websocket endpoint
//!
//! Each stream is a `programSubscribe` with server-side filters. Every
//! notification is turned into an [`AccountEvent`] and handed to an
//! [`AccountEventHandler`] in arrival order.

use async_trait::async_trait;
use futures_util::StreamExt;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::{info, warn};

use crate::infrastructure::blockchain::raydium_structures::{
    LIQUIDITY_MARKET_PROGRAM_OFFSET, LIQUIDITY_QUOTE_MINT_OFFSET, LIQUIDITY_STATE_V4_SIZE,
    LIQUIDITY_STATUS_OFFSET, MARKET_QUOTE_MINT_OFFSET, MARKET_STATE_V3_SIZE, OPENBOOK_PROGRAM_ID,
    POOL_STATUS_SWAP_ENABLED, RAYDIUM_AMM_V4_PROGRAM_ID,
};
use crate::shared::errors::ChainError;

/// Offset of the owner field in an SPL token account
const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

/// One account-change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEvent {
    pub key: Pubkey,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait AccountEventHandler: Send + Sync {
    async fn on_account_change(&self, event: AccountEvent);
}

/// Program id plus the filters a notification must satisfy
#[derive(Debug, Clone)]
pub struct ProgramSubscription {
    pub name: &'static str,
    pub program_id: Pubkey,
    pub filters: Vec<RpcFilterType>,
}

/// Swap-enabled Raydium v4 pools quoted in `quote_mint` and backed by an OpenBook market
pub fn pool_subscription(quote_mint: &Pubkey) -> ProgramSubscription {
    ProgramSubscription {
        name: "raydium pools",
        program_id: RAYDIUM_AMM_V4_PROGRAM_ID,
        filters: vec![
            RpcFilterType::DataSize(LIQUIDITY_STATE_V4_SIZE as u64),
            RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                LIQUIDITY_QUOTE_MINT_OFFSET,
                quote_mint.as_ref(),
            )),
            RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                LIQUIDITY_MARKET_PROGRAM_OFFSET,
                OPENBOOK_PROGRAM_ID.as_ref(),
            )),
            RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                LIQUIDITY_STATUS_OFFSET,
                &POOL_STATUS_SWAP_ENABLED.to_le_bytes(),
            )),
        ],
    }
}

/// OpenBook markets quoted in `quote_mint`
pub fn market_subscription(quote_mint: &Pubkey) -> ProgramSubscription {
    ProgramSubscription {
        name: "openbook markets",
        program_id: OPENBOOK_PROGRAM_ID,
        filters: vec![
            RpcFilterType::DataSize(MARKET_STATE_V3_SIZE as u64),
            RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                MARKET_QUOTE_MINT_OFFSET,
                quote_mint.as_ref(),
            )),
        ],
    }
}

pub fn wallet_token_account_filters(wallet: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(spl_token::state::Account::LEN as u64),
        RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            TOKEN_ACCOUNT_OWNER_OFFSET,
            wallet.as_ref(),
        )),
    ]
}

/// SPL token accounts owned by `wallet`
pub fn wallet_subscription(wallet: &Pubkey) -> ProgramSubscription {
    ProgramSubscription {
        name: "wallet token accounts",
        program_id: spl_token::id(),
        filters: wallet_token_account_filters(wallet),
    }
}

/// Subscribe and feed every notification to `handler` until the stream closes.
///
/// Returns an error on subscription failure or when the node drops the stream.
pub async fn run_subscription(
    pubsub: &PubsubClient,
    subscription: ProgramSubscription,
    commitment: CommitmentConfig,
    handler: &dyn AccountEventHandler,
) -> Result<(), ChainError> {
    let config = RpcProgramAccountsConfig {
        filters: Some(subscription.filters),
        account_config: RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(commitment),
            ..Default::default()
        },
        ..Default::default()
    };

    let (mut stream, _unsubscribe) = pubsub
        .program_subscribe(&subscription.program_id, Some(config))
        .await
        .map_err(|e| {
            ChainError::Subscription(format!("{} subscription failed: {}", subscription.name, e))
        })?;

    info!("📡 Subscribed to {} ({})", subscription.name, subscription.program_id);

    while let Some(update) = stream.next().await {
        let keyed = update.value;
        let key = match Pubkey::from_str(&keyed.pubkey) {
            Ok(key) => key,
            Err(e) => {
                warn!("Skipping notification with bad key {}: {}", keyed.pubkey, e);
                continue;
            }
        };
        let Some(account) = keyed.account.decode::<Account>() else {
            warn!(%key, "Skipping notification with undecodable account data");
            continue;
        };

        handler
            .on_account_change(AccountEvent {
                key,
                data: account.data,
            })
            .await;
    }

    Err(ChainError::Subscription(format!(
        "{} stream closed by node",
        subscription.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::raydium_structures::test_support::pool_state;
    use crate::shared::types::{USDC_MINT, WSOL_MINT};

    fn filters_accept(filters: &[RpcFilterType], data: &[u8]) -> bool {
        filters.iter().all(|filter| match filter {
            RpcFilterType::DataSize(size) => data.len() as u64 == *size,
            RpcFilterType::Memcmp(memcmp) => memcmp.bytes_match(data),
            _ => false,
        })
    }

    #[test]
    fn test_pool_filter_accepts_matching_pool() {
        let pool = pool_state(Pubkey::new_unique(), WSOL_MINT, 1);
        let data = bytemuck::bytes_of(&pool);

        assert!(filters_accept(&pool_subscription(&WSOL_MINT).filters, data));
        assert!(!filters_accept(&pool_subscription(&USDC_MINT).filters, data));
    }

    #[test]
    fn test_pool_filter_rejects_disabled_pool() {
        let mut pool = pool_state(Pubkey::new_unique(), WSOL_MINT, 1);
        pool.status = 1;
        assert!(!filters_accept(
            &pool_subscription(&WSOL_MINT).filters,
            bytemuck::bytes_of(&pool)
        ));
    }

    #[test]
    fn test_wallet_filter() {
        let wallet = Pubkey::new_unique();
        let account = spl_token::state::Account {
            mint: Pubkey::new_unique(),
            owner: wallet,
            amount: 7,
            state: spl_token::state::AccountState::Initialized,
            ..Default::default()
        };
        let mut data = vec![0u8; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(account, &mut data).unwrap();

        let subscription = wallet_subscription(&wallet);
        assert_eq!(subscription.program_id, spl_token::id());
        assert!(filters_accept(&subscription.filters, &data));
        assert!(!filters_accept(&wallet_subscription(&Pubkey::new_unique()).filters, &data));
    }

    #[test]
    fn test_market_subscription_targets_openbook() {
        let subscription = market_subscription(&USDC_MINT);
        assert_eq!(subscription.program_id, OPENBOOK_PROGRAM_ID);
        assert!(matches!(
            subscription.filters[0],
            RpcFilterType::DataSize(388)
        ));
    }
}
