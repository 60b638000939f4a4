use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Create ComputeBudget instruction to set priority fee
pub fn create_priority_fee_instruction(micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports)
}

/// Create ComputeBudget instruction to set compute unit limit
pub fn create_compute_unit_limit_instruction(compute_units: u32) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_limit(compute_units)
}

/// Priority fee instructions that lead every swap transaction
pub fn create_compute_budget_instructions(
    micro_lamports: u64,
    compute_units: u32,
) -> Vec<Instruction> {
    vec![
        create_priority_fee_instruction(micro_lamports),
        create_compute_unit_limit_instruction(compute_units),
    ]
}
