//! Trading domain - buy eligibility

pub mod snipe_list;
pub mod trade_gate;

pub use snipe_list::{parse_snipe_list, SnipeList, SnipeListRefresher};
pub use trade_gate::{check_pool, GateDecision, GateSettings, SkipReason, TradeGate};
