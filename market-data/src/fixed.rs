//! In-memory quote provider used by demo mode and tests

use async_trait::async_trait;
use common::decimal::Price;
use common::error::{Error, Result};
use common::model::{normalize_symbol, Quote};
use dashmap::DashMap;
use tracing::debug;

use crate::provider::QuoteProvider;

/// Serves prices from a concurrent map that can be updated at runtime
#[derive(Default)]
pub struct StaticQuoteProvider {
    prices: DashMap<String, Price>,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pre-loaded with the given prices
    pub fn with_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Price)>,
        S: AsRef<str>,
    {
        let provider = Self::new();
        for (symbol, price) in prices {
            provider.set_price(symbol.as_ref(), price);
        }
        provider
    }

    /// Set or replace the price of a symbol
    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.insert(symbol.trim().to_ascii_uppercase(), price);
    }

    /// Forget a symbol so that quoting it fails
    pub fn remove(&self, symbol: &str) {
        self.prices.remove(&symbol.trim().to_ascii_uppercase());
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)
            .map_err(|e| Error::QuoteUnavailable(e.to_string()))?;
        debug!("Static quote lookup for {}", symbol);

        let price = self
            .prices
            .get(&symbol)
            .map(|p| *p)
            .ok_or_else(|| Error::QuoteUnavailable(format!("no price for symbol {}", symbol)))?;

        if price <= Price::ZERO {
            return Err(Error::QuoteUnavailable(format!(
                "non-positive price {} for symbol {}",
                price, symbol
            )));
        }

        Ok(Quote::flat(symbol, price))
    }
}
