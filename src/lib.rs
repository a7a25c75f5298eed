//! TradeHub Wallet Client Library
//!
//! Headless SDK for a phone/OTP-authenticated wallet backend: balances with
//! cached fallback, bank accounts, withdrawals, deposits and history.

pub mod add_money;
pub mod api;
pub mod auth;
pub mod balance;
pub mod bank;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod money;
pub mod store;
pub mod withdraw;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
