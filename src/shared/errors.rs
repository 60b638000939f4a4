//! Error handling for the application

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Account layout decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid {layout} data size: expected {expected} bytes, got {actual}")]
    InvalidSize {
        layout: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid {layout} account data: {reason}")]
    InvalidData {
        layout: &'static str,
        reason: String,
    },
}

/// Node transport errors (RPC and pubsub)
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Transaction {signature} failed on chain: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("Blockhash expired before transaction {0} was confirmed")]
    BlockhashExpired(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Transaction build / submission errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to build transaction: {0}")]
    Build(String),

    #[error("Submission failed: {0}")]
    Submission(#[from] ChainError),

    #[error("No market data for mint {0}")]
    MissingMarket(Pubkey),
}

/// Errors that stop the process at startup
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unreadable private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Unsupported quote mint \"{0}\". Supported values are USDC and WSOL")]
    UnsupportedQuoteMint(String),

    #[error("No {symbol} token account found in wallet: {wallet}")]
    MissingQuoteTokenAccount { symbol: &'static str, wallet: Pubkey },

    #[error("No events received from node within {0} ms")]
    NoEventsReceived(u64),

    #[error("Chain error during startup: {0}")]
    Chain(#[from] ChainError),
}

impl From<DecodeError> for ExecutionError {
    fn from(err: DecodeError) -> Self {
        ExecutionError::Submission(ChainError::Decode(err))
    }
}
