//! Domain layer - core business logic and entities

pub mod execution;
pub mod pool;
pub mod trading;
