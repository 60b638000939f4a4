//! Runtime configuration
//!
//! The same [`Config`] struct is read either from the process environment
//! (optionally seeded from a `.env` file) or from a TOML file passed with
//! `--config`. Environment variable names are the upper-case field names,
//! e.g. `RPC_ENDPOINT`, `QUOTE_MINT`, `MAX_SELL_RETRIES`.

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Keypair;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::shared::errors::StartupError;
use crate::shared::types::{parse_ui_amount, Amount, QuoteToken};

#[derive(Clone, Deserialize)]
pub struct Config {
    // Node
    pub rpc_endpoint: String,
    pub rpc_websocket_endpoint: String,
    #[serde(default = "default_commitment_level")]
    pub commitment_level: String,
    /// Tracing filter, `RUST_LOG` applies when unset
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_network")]
    pub network: String,

    // Wallet
    pub private_key: String,

    // Buy
    #[serde(default = "default_quote_mint")]
    pub quote_mint: String,
    #[serde(default = "default_quote_amount")]
    pub quote_amount: String,
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: String,
    #[serde(default = "default_true")]
    pub check_if_mint_is_renounced: bool,
    #[serde(default = "default_max_pool_age_seconds")]
    pub max_pool_age_seconds: u64,
    #[serde(default = "default_buy_confirmation_timeout_ms")]
    pub buy_confirmation_timeout_ms: u64,

    // Snipe list
    #[serde(default)]
    pub use_snipe_list: bool,
    #[serde(default = "default_snipe_list_refresh_interval")]
    pub snipe_list_refresh_interval: u64,
    #[serde(default = "default_snipe_list_path")]
    pub snipe_list_path: String,

    // Sell
    #[serde(default = "default_true")]
    pub auto_sell: bool,
    #[serde(default)]
    pub auto_sell_delay: u64,
    #[serde(default = "default_max_sell_retries")]
    pub max_sell_retries: u32,
    #[serde(default = "default_sell_retry_backoff_ms")]
    pub sell_retry_backoff_ms: u64,

    // Fees
    #[serde(default = "default_compute_unit_price")]
    pub compute_unit_price: u64,
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,

    // Runtime
    #[serde(default)]
    pub paper_trade: bool,
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
    #[serde(default = "default_startup_watchdog_ms")]
    pub startup_watchdog_ms: u64,
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_commitment_level() -> String {
    "confirmed".to_string()
}
fn default_network() -> String {
    "mainnet-beta".to_string()
}
fn default_quote_mint() -> String {
    "WSOL".to_string()
}
fn default_quote_amount() -> String {
    "0.01".to_string()
}
fn default_min_pool_size() -> String {
    "0".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_pool_age_seconds() -> u64 {
    120
}
fn default_buy_confirmation_timeout_ms() -> u64 {
    10_000
}
fn default_snipe_list_refresh_interval() -> u64 {
    20_000
}
fn default_snipe_list_path() -> String {
    "snipe-list.txt".to_string()
}
fn default_max_sell_retries() -> u32 {
    5
}
fn default_sell_retry_backoff_ms() -> u64 {
    100
}
fn default_compute_unit_price() -> u64 {
    421_197
}
fn default_compute_unit_limit() -> u32 {
    101_337
}
fn default_report_interval_ms() -> u64 {
    10_000
}
fn default_startup_watchdog_ms() -> u64 {
    30_000
}
fn default_max_concurrent_tasks() -> usize {
    64
}

impl Config {
    /// Load from the environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();
        envy::from_env::<Config>().context("Failed to read configuration from environment")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Check every value that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<(), StartupError> {
        if !self.rpc_endpoint.starts_with("http") {
            return Err(StartupError::Config(format!(
                "RPC_ENDPOINT must be an http(s) URL, got \"{}\"",
                self.rpc_endpoint
            )));
        }
        if !self.rpc_websocket_endpoint.starts_with("ws") {
            return Err(StartupError::Config(format!(
                "RPC_WEBSOCKET_ENDPOINT must be a ws(s) URL, got \"{}\"",
                self.rpc_websocket_endpoint
            )));
        }

        let quote = self.quote_token()?;
        self.quote_amount_raw(quote)?;
        self.min_pool_size_raw(quote)?;
        self.commitment()?;

        if self.max_sell_retries == 0 {
            return Err(StartupError::Config(
                "MAX_SELL_RETRIES must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_tasks == 0 {
            return Err(StartupError::Config(
                "MAX_CONCURRENT_TASKS must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("BUY_CONFIRMATION_TIMEOUT_MS", self.buy_confirmation_timeout_ms),
            ("REPORT_INTERVAL_MS", self.report_interval_ms),
            ("STARTUP_WATCHDOG_MS", self.startup_watchdog_ms),
        ] {
            if value == 0 {
                return Err(StartupError::Config(format!("{} must be positive", name)));
            }
        }
        if self.use_snipe_list && self.snipe_list_refresh_interval == 0 {
            return Err(StartupError::Config(
                "SNIPE_LIST_REFRESH_INTERVAL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn quote_token(&self) -> Result<QuoteToken, StartupError> {
        QuoteToken::from_str(&self.quote_mint)
    }

    pub fn quote_amount_raw(&self, quote: QuoteToken) -> Result<Amount, StartupError> {
        quote
            .amount(&self.quote_amount)
            .map_err(|e| StartupError::Config(format!("QUOTE_AMOUNT: {}", e)))
    }

    pub fn min_pool_size_raw(&self, quote: QuoteToken) -> Result<Amount, StartupError> {
        parse_ui_amount(&self.min_pool_size, quote.decimals())
            .map(|value| Amount::new(value, quote.decimals()))
            .map_err(|e| StartupError::Config(format!("MIN_POOL_SIZE: {}", e)))
    }

    pub fn commitment(&self) -> Result<CommitmentConfig, StartupError> {
        CommitmentConfig::from_str(&self.commitment_level).map_err(|_| {
            StartupError::Config(format!(
                "Unknown COMMITMENT_LEVEL \"{}\"",
                self.commitment_level
            ))
        })
    }

    /// Decode the base58 private key into a signing keypair.
    pub fn keypair(&self) -> Result<Keypair, StartupError> {
        let bytes = bs58::decode(self.private_key.trim())
            .into_vec()
            .map_err(|e| StartupError::InvalidPrivateKey(e.to_string()))?;
        Keypair::from_bytes(&bytes).map_err(|e| StartupError::InvalidPrivateKey(e.to_string()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("rpc_websocket_endpoint", &self.rpc_websocket_endpoint)
            .field("commitment_level", &self.commitment_level)
            .field("network", &self.network)
            .field("private_key", &"<redacted>")
            .field("quote_mint", &self.quote_mint)
            .field("quote_amount", &self.quote_amount)
            .field("min_pool_size", &self.min_pool_size)
            .field("check_if_mint_is_renounced", &self.check_if_mint_is_renounced)
            .field("use_snipe_list", &self.use_snipe_list)
            .field("auto_sell", &self.auto_sell)
            .field("auto_sell_delay", &self.auto_sell_delay)
            .field("max_sell_retries", &self.max_sell_retries)
            .field("paper_trade", &self.paper_trade)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    toml::from_str(
        r#"
        rpc_endpoint = "http://127.0.0.1:8899"
        rpc_websocket_endpoint = "ws://127.0.0.1:8900"
        private_key = ""
        "#,
    )
    .expect("minimal config parses")
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = test_config();
        assert_eq!(config.quote_mint, "WSOL");
        assert_eq!(config.compute_unit_price, 421_197);
        assert_eq!(config.compute_unit_limit, 101_337);
        assert_eq!(config.buy_confirmation_timeout_ms, 10_000);
        assert_eq!(config.max_pool_age_seconds, 120);
        assert_eq!(config.sell_retry_backoff_ms, 100);
        assert_eq!(config.max_concurrent_tasks, 64);
        assert!(config.auto_sell);
        assert!(!config.paper_trade);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = test_config();
        config.quote_mint = "BONK".to_string();
        assert!(matches!(
            config.validate(),
            Err(StartupError::UnsupportedQuoteMint(_))
        ));

        let mut config = test_config();
        config.max_sell_retries = 0;
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let mut config = test_config();
        config.quote_amount = "lots".to_string();
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let mut config = test_config();
        config.commitment_level = "eventually".to_string();
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let mut config = test_config();
        config.report_interval_ms = 0;
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let mut config = test_config();
        config.startup_watchdog_ms = 0;
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));

        let mut config = test_config();
        config.buy_confirmation_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(StartupError::Config(_))));
    }

    #[test]
    fn test_keypair_decoding() {
        let keypair = Keypair::new();
        let mut config = test_config();
        config.private_key = bs58::encode(keypair.to_bytes()).into_string();
        assert_eq!(config.keypair().unwrap().pubkey(), keypair.pubkey());

        config.private_key = "not-base58!".to_string();
        assert!(matches!(
            config.keypair(),
            Err(StartupError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let mut config = test_config();
        config.private_key = "secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
    }
}
