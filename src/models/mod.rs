mod account;
mod transaction;

pub use account::{AccountNumber, AccountNumberError};
pub use transaction::Transaction;
