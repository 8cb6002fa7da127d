use async_trait::async_trait;
use common::error::Result;
use common::model::Quote;

/// Source of current market prices.
///
/// Implementations return `Error::QuoteUnavailable` when the symbol is unknown
/// or the upstream answers with a price that is not strictly positive.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the current quote for an already-normalized symbol
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;
}
