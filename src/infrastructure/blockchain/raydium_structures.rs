//! Raydium AMM v4 and OpenBook market v3 account structures
//!
//! Both layouts are fixed-size and read with `bytemuck`. Offsets used in the
//! subscription filters are derived from the structs with `offset_of!`, so a
//! filter can never drift from the decoder.

use bytemuck::{Pod, Zeroable};
use solana_sdk::{pubkey, pubkey::Pubkey};
use std::mem::{offset_of, size_of};

use crate::shared::errors::DecodeError;

pub const RAYDIUM_AMM_V4_PROGRAM_ID: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");
pub const OPENBOOK_PROGRAM_ID: Pubkey = pubkey!("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX");

/// `status` value of a pool that accepts swaps
pub const POOL_STATUS_SWAP_ENABLED: u64 = 6;

/// Raydium AMM v4 pool account (`LiquidityStateV4`, 752 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LiquidityStateV4 {
    pub status: u64,
    pub nonce: u64,
    pub max_order: u64,
    pub depth: u64,
    pub base_decimal: u64,
    pub quote_decimal: u64,
    pub state: u64,
    pub reset_flag: u64,
    pub min_size: u64,
    pub vol_max_cut_ratio: u64,
    pub amount_wave_ratio: u64,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub min_price_multiplier: u64,
    pub max_price_multiplier: u64,
    pub system_decimal_value: u64,
    pub min_separate_numerator: u64,
    pub min_separate_denominator: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub pnl_numerator: u64,
    pub pnl_denominator: u64,
    pub swap_fee_numerator: u64,
    pub swap_fee_denominator: u64,
    pub base_need_take_pnl: u64,
    pub quote_need_take_pnl: u64,
    pub quote_total_pnl: u64,
    pub base_total_pnl: u64,
    pub pool_open_time: u64,
    pub punish_pc_amount: u64,
    pub punish_coin_amount: u64,
    pub orderbook_to_init_time: u64,
    // u128 fields are stored as raw bytes to keep the struct free of padding
    pub swap_base_in_amount: [u8; 16],
    pub swap_quote_out_amount: [u8; 16],
    pub swap_base2_quote_fee: u64,
    pub swap_quote_in_amount: [u8; 16],
    pub swap_base_out_amount: [u8; 16],
    pub swap_quote2_base_fee: u64,
    pub base_vault: [u8; 32],
    pub quote_vault: [u8; 32],
    pub base_mint: [u8; 32],
    pub quote_mint: [u8; 32],
    pub lp_mint: [u8; 32],
    pub open_orders: [u8; 32],
    pub market_id: [u8; 32],
    pub market_program_id: [u8; 32],
    pub target_orders: [u8; 32],
    pub withdraw_queue: [u8; 32],
    pub lp_vault: [u8; 32],
    pub owner: [u8; 32],
    pub lp_reserve: u64,
    pub padding: [u64; 3],
}

pub const LIQUIDITY_STATE_V4_SIZE: usize = size_of::<LiquidityStateV4>();
pub const LIQUIDITY_QUOTE_MINT_OFFSET: usize = offset_of!(LiquidityStateV4, quote_mint);
pub const LIQUIDITY_MARKET_PROGRAM_OFFSET: usize = offset_of!(LiquidityStateV4, market_program_id);
pub const LIQUIDITY_STATUS_OFFSET: usize = offset_of!(LiquidityStateV4, status);

impl LiquidityStateV4 {
    pub fn base_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.base_mint)
    }

    pub fn quote_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.quote_mint)
    }

    pub fn market_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.market_id)
    }

    pub fn market_program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.market_program_id)
    }

    /// Total quote tokens swapped in, the pool-size proxy used by the gate
    pub fn swap_quote_in_amount(&self) -> u128 {
        u128::from_le_bytes(self.swap_quote_in_amount)
    }
}

/// Decode a pool account. Data must be exactly one `LiquidityStateV4`.
pub fn decode_liquidity_state(data: &[u8]) -> Result<LiquidityStateV4, DecodeError> {
    if data.len() != LIQUIDITY_STATE_V4_SIZE {
        return Err(DecodeError::InvalidSize {
            layout: "LiquidityStateV4",
            expected: LIQUIDITY_STATE_V4_SIZE,
            actual: data.len(),
        });
    }
    // Notification buffers carry no alignment guarantee
    bytemuck::try_pod_read_unaligned(data).map_err(|e| DecodeError::InvalidData {
        layout: "LiquidityStateV4",
        reason: e.to_string(),
    })
}

/// OpenBook (Serum) market account (`MarketStateV3`, 388 bytes)
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MarketStateV3 {
    pub head_padding: [u8; 5],
    pub account_flags: u64,
    pub own_address: [u8; 32],
    pub vault_signer_nonce: u64,
    pub base_mint: [u8; 32],
    pub quote_mint: [u8; 32],
    pub base_vault: [u8; 32],
    pub base_deposits_total: u64,
    pub base_fees_accrued: u64,
    pub quote_vault: [u8; 32],
    pub quote_deposits_total: u64,
    pub quote_fees_accrued: u64,
    pub quote_dust_threshold: u64,
    pub request_queue: [u8; 32],
    pub event_queue: [u8; 32],
    pub bids: [u8; 32],
    pub asks: [u8; 32],
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u64,
    pub referrer_rebates_accrued: u64,
    pub tail_padding: [u8; 7],
}

pub const MARKET_STATE_V3_SIZE: usize = size_of::<MarketStateV3>();
pub const MARKET_QUOTE_MINT_OFFSET: usize = offset_of!(MarketStateV3, quote_mint);

impl MarketStateV3 {
    pub fn base_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.base_mint)
    }

    pub fn quote_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.quote_mint)
    }
}

pub fn decode_market_state(data: &[u8]) -> Result<MarketStateV3, DecodeError> {
    if data.len() != MARKET_STATE_V3_SIZE {
        return Err(DecodeError::InvalidSize {
            layout: "MarketStateV3",
            expected: MARKET_STATE_V3_SIZE,
            actual: data.len(),
        });
    }
    bytemuck::try_pod_read_unaligned(data).map_err(|e| DecodeError::InvalidData {
        layout: "MarketStateV3",
        reason: e.to_string(),
    })
}

/// Market accounts needed by the swap instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketMeta {
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub event_queue: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub vault_signer_nonce: u64,
}

impl From<&MarketStateV3> for MarketMeta {
    fn from(market: &MarketStateV3) -> Self {
        let nonce = market.vault_signer_nonce;
        Self {
            bids: Pubkey::new_from_array(market.bids),
            asks: Pubkey::new_from_array(market.asks),
            event_queue: Pubkey::new_from_array(market.event_queue),
            base_vault: Pubkey::new_from_array(market.base_vault),
            quote_vault: Pubkey::new_from_array(market.quote_vault),
            vault_signer_nonce: nonce,
        }
    }
}

/// Full account set for a Raydium v4 swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolKeys {
    pub id: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub program_id: Pubkey,
    pub authority: Pubkey,
    pub open_orders: Pubkey,
    pub target_orders: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub market_program_id: Pubkey,
    pub market_id: Pubkey,
    pub market_authority: Pubkey,
    pub market_base_vault: Pubkey,
    pub market_quote_vault: Pubkey,
    pub market_bids: Pubkey,
    pub market_asks: Pubkey,
    pub market_event_queue: Pubkey,
}

/// PDA that owns every Raydium v4 pool vault
pub fn amm_authority() -> Pubkey {
    Pubkey::find_program_address(&[b"amm authority"], &RAYDIUM_AMM_V4_PROGRAM_ID).0
}

/// Vault signer of an OpenBook market
pub fn market_authority(
    market_id: &Pubkey,
    vault_signer_nonce: u64,
    market_program_id: &Pubkey,
) -> Result<Pubkey, DecodeError> {
    Pubkey::create_program_address(
        &[market_id.as_ref(), &vault_signer_nonce.to_le_bytes()],
        market_program_id,
    )
    .map_err(|e| DecodeError::InvalidData {
        layout: "MarketStateV3",
        reason: format!("vault signer derivation failed: {}", e),
    })
}

impl PoolKeys {
    /// Combine a decoded pool with the metadata of its market.
    pub fn from_states(
        id: Pubkey,
        pool: &LiquidityStateV4,
        market: &MarketMeta,
    ) -> Result<Self, DecodeError> {
        let market_id = pool.market_id();
        let market_program_id = pool.market_program_id();
        Ok(Self {
            id,
            base_mint: pool.base_mint(),
            quote_mint: pool.quote_mint(),
            lp_mint: Pubkey::new_from_array(pool.lp_mint),
            base_decimals: pool.base_decimal as u8,
            quote_decimals: pool.quote_decimal as u8,
            program_id: RAYDIUM_AMM_V4_PROGRAM_ID,
            authority: amm_authority(),
            open_orders: Pubkey::new_from_array(pool.open_orders),
            target_orders: Pubkey::new_from_array(pool.target_orders),
            base_vault: Pubkey::new_from_array(pool.base_vault),
            quote_vault: Pubkey::new_from_array(pool.quote_vault),
            market_program_id,
            market_id,
            market_authority: market_authority(
                &market_id,
                market.vault_signer_nonce,
                &market_program_id,
            )?,
            market_base_vault: market.base_vault,
            market_quote_vault: market.quote_vault,
            market_bids: market.bids,
            market_asks: market.asks,
            market_event_queue: market.event_queue,
        })
    }
}
