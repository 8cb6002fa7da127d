//! Trade execution: the pure portfolio ledger and the executor that serializes
//! trades per account around it.

pub mod executor;
pub mod ledger;
mod order;

pub use executor::{TradeExecutor, DEFAULT_QUOTE_TIMEOUT};
pub use order::{Order, TradeRequest};
