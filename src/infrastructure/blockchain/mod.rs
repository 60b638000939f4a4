//! Solana node access, account layouts and instruction builders

pub mod chain_client;
pub mod compute_budget;
pub mod raydium_structures;
pub mod subscriptions;
pub mod swap_instruction;

pub use chain_client::{ChainClient, RpcChainClient};
pub use subscriptions::{AccountEvent, AccountEventHandler};
