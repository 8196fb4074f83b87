//! Data models: receipts, transactions, money helpers, configuration.

pub mod config;
pub mod money;
pub mod receipt;
pub mod transaction;
