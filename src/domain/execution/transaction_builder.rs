//! Transaction building and construction

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::sync::Arc;

use crate::infrastructure::blockchain::compute_budget::create_compute_budget_instructions;
use crate::infrastructure::blockchain::raydium_structures::PoolKeys;
use crate::infrastructure::blockchain::swap_instruction::{build_swap_instruction, UserKeys};
use crate::shared::errors::ExecutionError;

/// Builds and signs swap transactions for the operator wallet
pub struct TransactionBuilder {
    payer: Arc<Keypair>,
    compute_unit_price: u64,
    compute_unit_limit: u32,
}

impl TransactionBuilder {
    pub fn new(payer: Arc<Keypair>, compute_unit_price: u64, compute_unit_limit: u32) -> Self {
        Self {
            payer,
            compute_unit_price,
            compute_unit_limit,
        }
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    /// Quote -> base swap of exactly `amount_in`, creating the base token account if needed
    pub fn build_buy(
        &self,
        pool_keys: &PoolKeys,
        quote_account: &Pubkey,
        base_account: &Pubkey,
        amount_in: u64,
        blockhash: Hash,
    ) -> Result<VersionedTransaction, ExecutionError> {
        let owner = self.payer();
        let swap = build_swap_instruction(
            pool_keys,
            &UserKeys {
                token_account_in: *quote_account,
                token_account_out: *base_account,
                owner,
            },
            amount_in,
            0,
        );

        let mut instructions =
            create_compute_budget_instructions(self.compute_unit_price, self.compute_unit_limit);
        instructions.push(create_associated_token_account_idempotent(
            &owner,
            &owner,
            &pool_keys.base_mint,
            &spl_token::id(),
        ));
        instructions.extend(swap.instructions);

        self.sign(&instructions, blockhash)
    }

    /// Base -> quote swap of the whole balance, then close the emptied account
    pub fn build_sell(
        &self,
        pool_keys: &PoolKeys,
        base_account: &Pubkey,
        quote_account: &Pubkey,
        amount_in: u64,
        blockhash: Hash,
    ) -> Result<VersionedTransaction, ExecutionError> {
        let owner = self.payer();
        let swap = build_swap_instruction(
            pool_keys,
            &UserKeys {
                token_account_in: *base_account,
                token_account_out: *quote_account,
                owner,
            },
            amount_in,
            0,
        );

        let mut instructions =
            create_compute_budget_instructions(self.compute_unit_price, self.compute_unit_limit);
        instructions.extend(swap.instructions);
        instructions.push(
            spl_token::instruction::close_account(
                &spl_token::id(),
                base_account,
                &owner,
                &owner,
                &[],
            )
            .map_err(|e| ExecutionError::Build(format!("close account: {}", e)))?,
        );

        self.sign(&instructions, blockhash)
    }

    fn sign(
        &self,
        instructions: &[Instruction],
        blockhash: Hash,
    ) -> Result<VersionedTransaction, ExecutionError> {
        let message = v0::Message::try_compile(&self.payer(), instructions, &[], blockhash)
            .map_err(|e| ExecutionError::Build(e.to_string()))?;
        VersionedTransaction::try_new(VersionedMessage::V0(message), &[self.payer.as_ref()])
            .map_err(|e| ExecutionError::Build(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::blockchain::swap_instruction::test_pool_keys;
    use crate::shared::types::WSOL_MINT;
    use solana_sdk::compute_budget;

    fn program_ids(tx: &VersionedTransaction) -> Vec<Pubkey> {
        let keys = tx.message.static_account_keys();
        tx.message
            .instructions()
            .iter()
            .map(|ix| keys[ix.program_id_index as usize])
            .collect()
    }

    #[test]
    fn test_buy_transaction_layout() {
        let builder = TransactionBuilder::new(Arc::new(Keypair::new()), 421_197, 101_337);
        let keys = test_pool_keys(Pubkey::new_unique(), WSOL_MINT);

        let tx = builder
            .build_buy(&keys, &Pubkey::new_unique(), &Pubkey::new_unique(), 1_000, Hash::new_unique())
            .unwrap();

        assert_eq!(
            program_ids(&tx),
            vec![
                compute_budget::id(),
                compute_budget::id(),
                spl_associated_token_account::id(),
                keys.program_id,
            ]
        );
        assert_eq!(tx.signatures.len(), 1);
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_sell_transaction_closes_account() {
        let builder = TransactionBuilder::new(Arc::new(Keypair::new()), 1, 1);
        let keys = test_pool_keys(Pubkey::new_unique(), WSOL_MINT);

        let tx = builder
            .build_sell(&keys, &Pubkey::new_unique(), &Pubkey::new_unique(), 500, Hash::new_unique())
            .unwrap();

        assert_eq!(
            program_ids(&tx),
            vec![
                compute_budget::id(),
                compute_budget::id(),
                keys.program_id,
                spl_token::id(),
            ]
        );
    }
}
