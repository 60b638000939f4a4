//! Node access behind a narrow async seam
//!
//! Trading code only sees [`ChainClient`]. Production uses [`RpcChainClient`]
//! over the nonblocking RPC client; tests use the scripted mock at the bottom
//! of this file.

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;
use tracing::debug;

use crate::infrastructure::blockchain::subscriptions::wallet_token_account_filters;
use crate::shared::errors::{ChainError, DecodeError};

const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Recent blockhash with its expiry height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashInfo {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// SPL token account owned by the operator wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletTokenAccount {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

/// Decode an SPL token account (165 bytes)
pub fn decode_token_account(data: &[u8]) -> Result<spl_token::state::Account, DecodeError> {
    spl_token::state::Account::unpack(data).map_err(|e| DecodeError::InvalidData {
        layout: "TokenAccount",
        reason: e.to_string(),
    })
}

/// Decode an SPL mint (82 bytes)
pub fn decode_mint(data: &[u8]) -> Result<spl_token::state::Mint, DecodeError> {
    spl_token::state::Mint::unpack(data).map_err(|e| DecodeError::InvalidData {
        layout: "Mint",
        reason: e.to_string(),
    })
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo, ChainError>;

    /// Submit without preflight and return the signature
    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError>;

    /// Wait until the signature reaches the client's commitment level.
    ///
    /// Fails when the node reports a transaction error or the blockhash
    /// expires first. Has no timeout of its own.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> Result<(), ChainError>;

    /// Raw account data, `None` when the account does not exist
    async fn get_account_data(&self, key: &Pubkey) -> Result<Option<Vec<u8>>, ChainError>;

    async fn get_wallet_token_accounts(
        &self,
        wallet: &Pubkey,
    ) -> Result<Vec<WalletTokenAccount>, ChainError>;

    async fn get_balance(&self, key: &Pubkey) -> Result<u64, ChainError>;
}

/// RPC-backed client
pub struct RpcChainClient {
    rpc: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcChainClient {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, commitment),
            commitment,
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo, ChainError> {
        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(BlockhashInfo {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        Ok(self.rpc.send_transaction_with_config(tx, config).await?)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> Result<(), ChainError> {
        loop {
            let statuses = self.rpc.get_signature_statuses(&[*signature]).await?;
            if let Some(Some(status)) = statuses.value.first() {
                if let Some(err) = &status.err {
                    return Err(ChainError::TransactionFailed {
                        signature: signature.to_string(),
                        reason: err.to_string(),
                    });
                }
                if status.satisfies_commitment(self.commitment) {
                    return Ok(());
                }
            }

            let block_height = self
                .rpc
                .get_block_height_with_commitment(self.commitment)
                .await?;
            if block_height > last_valid_block_height {
                return Err(ChainError::BlockhashExpired(signature.to_string()));
            }

            debug!(%signature, block_height, "waiting for confirmation");
            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }

    async fn get_account_data(&self, key: &Pubkey) -> Result<Option<Vec<u8>>, ChainError> {
        let response = self
            .rpc
            .get_account_with_commitment(key, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn get_wallet_token_accounts(
        &self,
        wallet: &Pubkey,
    ) -> Result<Vec<WalletTokenAccount>, ChainError> {
        let config = RpcProgramAccountsConfig {
            filters: Some(wallet_token_account_filters(wallet)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.commitment),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .rpc
            .get_program_accounts_with_config(&spl_token::id(), config)
            .await?;

        accounts
            .into_iter()
            .map(|(address, account)| -> Result<WalletTokenAccount, ChainError> {
                let token = decode_token_account(&account.data)?;
                Ok(WalletTokenAccount {
                    address,
                    mint: token.mint,
                    amount: token.amount,
                })
            })
            .collect()
    }

    async fn get_balance(&self, key: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.rpc.get_balance(key).await?)
    }
}
