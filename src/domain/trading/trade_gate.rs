//! Buy eligibility for newly discovered pools
//!
//! The synchronous checks (age, snipe list, pool size) are a pure function of
//! the pool, the clock and a snipe-list snapshot. The mint-authority check
//! needs one account read and fails closed.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::trading::snipe_list::SnipeList;
use crate::infrastructure::blockchain::chain_client::{decode_mint, ChainClient};
use crate::infrastructure::blockchain::raydium_structures::LiquidityStateV4;
use crate::shared::utils::unix_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSettings {
    /// 0 disables the freshness check
    pub max_pool_age_seconds: u64,
    pub use_snipe_list: bool,
    /// Raw quote units, 0 disables the size check
    pub min_pool_size: u64,
    pub check_mint_renounced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    TooOld { age_seconds: u64 },
    NotInSnipeList,
    PoolTooSmall { pooled: u128, minimum: u64 },
    MintNotRenounced,
    MintUnreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooOld { age_seconds } => write!(f, "pool is {}s old", age_seconds),
            SkipReason::NotInSnipeList => write!(f, "mint not in snipe list"),
            SkipReason::PoolTooSmall { pooled, minimum } => {
                write!(f, "pool size {} below minimum {}", pooled, minimum)
            }
            SkipReason::MintNotRenounced => write!(f, "owner can mint tokens"),
            SkipReason::MintUnreadable(e) => write!(f, "mint check failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub proceed: bool,
    pub reason: Option<SkipReason>,
}

impl GateDecision {
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            reason: None,
        }
    }

    pub fn skip(reason: SkipReason) -> Self {
        Self {
            proceed: false,
            reason: Some(reason),
        }
    }
}

/// Age, snipe-list and pool-size checks, in that order
pub fn check_pool(
    settings: &GateSettings,
    pool: &LiquidityStateV4,
    now: u64,
    snipe_list: &HashSet<Pubkey>,
) -> GateDecision {
    if settings.max_pool_age_seconds > 0 {
        let age_seconds = now.saturating_sub(pool.pool_open_time);
        if age_seconds > settings.max_pool_age_seconds {
            return GateDecision::skip(SkipReason::TooOld { age_seconds });
        }
    }

    if settings.use_snipe_list && !snipe_list.contains(&pool.base_mint()) {
        return GateDecision::skip(SkipReason::NotInSnipeList);
    }

    if settings.min_pool_size > 0 {
        let pooled = pool.swap_quote_in_amount();
        if pooled < settings.min_pool_size as u128 {
            return GateDecision::skip(SkipReason::PoolTooSmall {
                pooled,
                minimum: settings.min_pool_size,
            });
        }
    }

    GateDecision::proceed()
}

pub struct TradeGate {
    settings: GateSettings,
    snipe_list: Arc<SnipeList>,
    client: Arc<dyn ChainClient>,
}

impl TradeGate {
    pub fn new(settings: GateSettings, snipe_list: Arc<SnipeList>, client: Arc<dyn ChainClient>) -> Self {
        Self {
            settings,
            snipe_list,
            client,
        }
    }

    pub async fn should_buy(&self, pool: &LiquidityStateV4) -> GateDecision {
        let mint = pool.base_mint();
        let snapshot = self.snipe_list.snapshot();

        let decision = check_pool(&self.settings, pool, unix_now(), &snapshot);
        if let Some(reason) = &decision.reason {
            match reason {
                SkipReason::PoolTooSmall { .. } => warn!(%mint, "Skipping pool: {}", reason),
                _ => info!(%mint, "Skipping pool: {}", reason),
            }
            return decision;
        }

        if self.settings.check_mint_renounced {
            if let Some(reason) = self.check_mint_authority(&mint).await {
                warn!(%mint, "Skipping pool: {}", reason);
                return GateDecision::skip(reason);
            }
        }

        GateDecision::proceed()
    }

    /// `None` when the mint has no authority; any failure to tell is a skip
    async fn check_mint_authority(&self, mint: &Pubkey) -> Option<SkipReason> {
        let data = match self.client.get_account_data(mint).await {
            Ok(Some(data)) => data,
            Ok(None) => return Some(SkipReason::MintUnreadable("mint account not found".to_string())),
            Err(e) => return Some(SkipReason::MintUnreadable(e.to_string())),
        };

        match decode_mint(&data) {
            Ok(state) if state.mint_authority.is_some() => Some(SkipReason::MintNotRenounced),
            Ok(_) => None,
            Err(e) => Some(SkipReason::MintUnreadable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::chain_client::mock::MockChainClient;
    use crate::infrastructure::blockchain::raydium_structures::test_support::pool_state;
    use crate::shared::types::WSOL_MINT;
    use solana_sdk::program_option::COption;
    use solana_sdk::program_pack::Pack;

    const NOW: u64 = 1_700_000_100;

    fn settings() -> GateSettings {
        GateSettings {
            max_pool_age_seconds: 120,
            use_snipe_list: false,
            min_pool_size: 0,
            check_mint_renounced: false,
        }
    }

    fn mint_data(authority: COption<Pubkey>) -> Vec<u8> {
        let mint = spl_token::state::Mint {
            mint_authority: authority,
            supply: 1_000_000,
            decimals: 6,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; spl_token::state::Mint::LEN];
        spl_token::state::Mint::pack(mint, &mut data).unwrap();
        data
    }

    #[test]
    fn test_check_is_deterministic() {
        let pool = pool_state(Pubkey::new_unique(), WSOL_MINT, NOW - 5);
        let list = HashSet::new();
        let first = check_pool(&settings(), &pool, NOW, &list);
        let second = check_pool(&settings(), &pool, NOW, &list);
        assert_eq!(first, second);
        assert!(first.proceed);
    }

    #[test]
    fn test_rejects_old_pool() {
        let pool = pool_state(Pubkey::new_unique(), WSOL_MINT, NOW - 500);
        let decision = check_pool(&settings(), &pool, NOW, &HashSet::new());
        assert_eq!(decision.reason, Some(SkipReason::TooOld { age_seconds: 500 }));

        let unlimited = GateSettings {
            max_pool_age_seconds: 0,
            ..settings()
        };
        assert!(check_pool(&unlimited, &pool, NOW, &HashSet::new()).proceed);
    }

    #[test]
    fn test_snipe_list_filters_mints() {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let list = HashSet::from([mint_a]);
        let settings = GateSettings {
            use_snipe_list: true,
            ..settings()
        };

        let pool_a = pool_state(mint_a, WSOL_MINT, NOW);
        let pool_b = pool_state(mint_b, WSOL_MINT, NOW);
        assert!(check_pool(&settings, &pool_a, NOW, &list).proceed);
        assert_eq!(
            check_pool(&settings, &pool_b, NOW, &list).reason,
            Some(SkipReason::NotInSnipeList)
        );
    }

    #[test]
    fn test_rejects_small_pool() {
        let mut pool = pool_state(Pubkey::new_unique(), WSOL_MINT, NOW);
        pool.swap_quote_in_amount = 1_000_000_000u128.to_le_bytes();
        let settings = GateSettings {
            min_pool_size: 5_000_000_000,
            ..settings()
        };

        let decision = check_pool(&settings, &pool, NOW, &HashSet::new());
        assert!(!decision.proceed);
        assert!(matches!(decision.reason, Some(SkipReason::PoolTooSmall { .. })));

        pool.swap_quote_in_amount = 5_000_000_000u128.to_le_bytes();
        assert!(check_pool(&settings, &pool, NOW, &HashSet::new()).proceed);
    }

    fn gate_with(client: MockChainClient) -> TradeGate {
        TradeGate::new(
            GateSettings {
                max_pool_age_seconds: 0,
                check_mint_renounced: true,
                ..settings()
            },
            Arc::new(SnipeList::new()),
            Arc::new(client),
        )
    }

    #[tokio::test]
    async fn test_mint_with_authority_rejected() {
        let mint = Pubkey::new_unique();
        let client = MockChainClient::new()
            .with_account(mint, mint_data(COption::Some(Pubkey::new_unique())));
        let gate = gate_with(client);

        let decision = gate.should_buy(&pool_state(mint, WSOL_MINT, 0)).await;
        assert_eq!(decision.reason, Some(SkipReason::MintNotRenounced));
    }

    #[tokio::test]
    async fn test_renounced_mint_accepted() {
        let mint = Pubkey::new_unique();
        let client = MockChainClient::new().with_account(mint, mint_data(COption::None));
        let gate = gate_with(client);

        assert!(gate.should_buy(&pool_state(mint, WSOL_MINT, 0)).await.proceed);
    }

    #[tokio::test]
    async fn test_mint_check_fails_closed() {
        let mint = Pubkey::new_unique();

        let missing = gate_with(MockChainClient::new());
        let decision = missing.should_buy(&pool_state(mint, WSOL_MINT, 0)).await;
        assert!(matches!(decision.reason, Some(SkipReason::MintUnreadable(_))));

        let failing = gate_with(MockChainClient {
            fail_account_reads: true,
            ..Default::default()
        });
        let decision = failing.should_buy(&pool_state(mint, WSOL_MINT, 0)).await;
        assert!(!decision.proceed);

        let garbage = gate_with(MockChainClient::new().with_account(mint, vec![1, 2, 3]));
        let decision = garbage.should_buy(&pool_state(mint, WSOL_MINT, 0)).await;
        assert!(matches!(decision.reason, Some(SkipReason::MintUnreadable(_))));
    }
}
