//! Clients for fetching account data from bank portals.

pub mod kbank;

pub use kbank::{KBankClient, KBankError, LoginState};
