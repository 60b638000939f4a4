//! Raydium AMM v4 `SwapBaseIn` instruction builder

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::infrastructure::blockchain::raydium_structures::PoolKeys;

/// `SwapBaseIn` discriminator in the AMM v4 instruction enum
pub const SWAP_BASE_IN_DISCRIMINATOR: u8 = 9;

/// Wallet side of a swap
#[derive(Debug, Clone, Copy)]
pub struct UserKeys {
    pub token_account_in: Pubkey,
    pub token_account_out: Pubkey,
    pub owner: Pubkey,
}

#[derive(Debug, Clone)]
pub struct SwapInstructions {
    pub instructions: Vec<Instruction>,
}

/// Swap exactly `amount_in` of the input token, accepting at least `min_amount_out`.
///
/// Direction is given by the user accounts: the pool settles whichever side
/// `token_account_in` holds.
pub fn build_swap_instruction(
    pool_keys: &PoolKeys,
    user_keys: &UserKeys,
    amount_in: u64,
    min_amount_out: u64,
) -> SwapInstructions {
    let mut data = Vec::with_capacity(17);
    data.push(SWAP_BASE_IN_DISCRIMINATOR);
    data.extend_from_slice(&amount_in.to_le_bytes());
    data.extend_from_slice(&min_amount_out.to_le_bytes());

    let accounts = vec![
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new(pool_keys.id, false),
        AccountMeta::new_readonly(pool_keys.authority, false),
        AccountMeta::new(pool_keys.open_orders, false),
        AccountMeta::new(pool_keys.target_orders, false),
        AccountMeta::new(pool_keys.base_vault, false),
        AccountMeta::new(pool_keys.quote_vault, false),
        AccountMeta::new_readonly(pool_keys.market_program_id, false),
        AccountMeta::new(pool_keys.market_id, false),
        AccountMeta::new(pool_keys.market_bids, false),
        AccountMeta::new(pool_keys.market_asks, false),
        AccountMeta::new(pool_keys.market_event_queue, false),
        AccountMeta::new(pool_keys.market_base_vault, false),
        AccountMeta::new(pool_keys.market_quote_vault, false),
        AccountMeta::new_readonly(pool_keys.market_authority, false),
        AccountMeta::new(user_keys.token_account_in, false),
        AccountMeta::new(user_keys.token_account_out, false),
        AccountMeta::new_readonly(user_keys.owner, true),
    ];

    SwapInstructions {
        instructions: vec![Instruction {
            program_id: pool_keys.program_id,
            accounts,
            data,
        }],
    }
}

#[cfg(test)]
pub(crate) fn test_pool_keys(base_mint: Pubkey, quote_mint: Pubkey) -> PoolKeys {
    use crate::infrastructure::blockchain::raydium_structures::RAYDIUM_AMM_V4_PROGRAM_ID;
    PoolKeys {
        id: Pubkey::new_unique(),
        base_mint,
        quote_mint,
        lp_mint: Pubkey::new_unique(),
        base_decimals: 6,
        quote_decimals: 9,
        program_id: RAYDIUM_AMM_V4_PROGRAM_ID,
        authority: Pubkey::new_unique(),
        open_orders: Pubkey::new_unique(),
        target_orders: Pubkey::new_unique(),
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        market_program_id: Pubkey::new_unique(),
        market_id: Pubkey::new_unique(),
        market_authority: Pubkey::new_unique(),
        market_base_vault: Pubkey::new_unique(),
        market_quote_vault: Pubkey::new_unique(),
        market_bids: Pubkey::new_unique(),
        market_asks: Pubkey::new_unique(),
        market_event_queue: Pubkey::new_unique(),
    }
}
