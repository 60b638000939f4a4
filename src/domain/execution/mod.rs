//! Execution domain - transaction building and submission

mod transaction_builder;
mod transaction_submitter;

pub use transaction_builder::TransactionBuilder;
pub use transaction_submitter::{
    BuyOutcome, SellOutcome, SubmitterSettings, TransactionAttempt, TransactionSubmitter,
};
