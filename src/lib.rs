//! raysniper - Raydium AMM v4 pool sniper
//!
//! Watches the Raydium v4 program for newly opened pools, buys the ones that
//! pass the trade gate and sells whatever lands in the operator wallet.

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use domain::execution::TransactionSubmitter;
pub use domain::pool::{MarketCache, PoolWatcher};
pub use domain::trading::TradeGate;
pub use shared::config::Config;
