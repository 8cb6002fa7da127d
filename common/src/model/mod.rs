//! Domain models for the brokerage backend

pub mod account;
pub mod transaction;
pub mod quote;

pub use account::{Account, Credentials, NewAccount, Portfolio, Position};
pub use quote::{normalize_symbol, Quote};
pub use transaction::{TradeAction, Transaction};
