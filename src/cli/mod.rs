//! Operator CLI
//!
//! Thin command layer over the SDK. Each subcommand builds the client
//! stack from configuration and drives one flow end to end.

pub mod commands;
