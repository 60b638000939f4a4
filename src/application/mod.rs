//! Application layer - wiring, background tasks and handlers

pub mod reporter;
pub mod sniper;
pub mod task_set;
pub mod wallet_watcher;

pub use reporter::{startup_watchdog, ReportSnapshot, Reporter};
pub use sniper::Sniper;
pub use task_set::TaskSet;
pub use wallet_watcher::WalletWatcher;
