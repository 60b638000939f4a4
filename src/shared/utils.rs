//! Utility functions and helpers

use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Solscan link for a transaction on the given cluster
pub fn solscan_url(signature: &Signature, network: &str) -> String {
    format!("https://solscan.io/tx/{}?cluster={}", signature, network)
}

/// DexScreener chart filtered to the wallet's own trades
pub fn dexscreener_maker_url(mint: &Pubkey, wallet: &Pubkey) -> String {
    format!("https://dexscreener.com/solana/{}?maker={}", mint, wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_urls() {
        let sig = Signature::default();
        assert_eq!(
            solscan_url(&sig, "mainnet-beta"),
            format!("https://solscan.io/tx/{}?cluster=mainnet-beta", sig)
        );

        let mint = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let url = dexscreener_maker_url(&mint, &wallet);
        assert!(url.starts_with(&format!("https://dexscreener.com/solana/{}", mint)));
        assert!(url.ends_with(&format!("?maker={}", wallet)));
    }
}
