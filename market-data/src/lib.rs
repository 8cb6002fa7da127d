//! Quote providers: the source of current market prices for trades

mod config;
mod finnhub;
mod provider;
mod fixed;

pub use config::QuoteProviderConfig;
pub use finnhub::{FinnhubQuote, FinnhubQuoteProvider};
pub use fixed::StaticQuoteProvider;
pub use provider::QuoteProvider;
