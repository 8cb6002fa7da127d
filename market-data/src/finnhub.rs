//! Finnhub REST quote provider

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::{price_from_f64, Price};
use common::error::{Error, Result};
use common::model::{normalize_symbol, Quote};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::QuoteProviderConfig;
use crate::provider::QuoteProvider;

/// Raw `/quote` response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinnhubQuote {
    /// Current price
    #[serde(rename = "c", default)]
    pub current: f64,
    /// High price of the day
    #[serde(rename = "h", default)]
    pub high: f64,
    /// Low price of the day
    #[serde(rename = "l", default)]
    pub low: f64,
    /// Open price of the day
    #[serde(rename = "o", default)]
    pub open: f64,
    /// Previous close price
    #[serde(rename = "pc", default)]
    pub previous_close: f64,
}

impl FinnhubQuote {
    /// Convert the upstream payload, rejecting a missing or non-positive current price.
    ///
    /// Finnhub answers unknown symbols with an all-zero body rather than an error.
    pub fn into_quote(self, symbol: &str) -> Result<Quote> {
        let current = price_from_f64(self.current)
            .filter(|p| *p > Price::ZERO)
            .ok_or_else(|| {
                Error::QuoteUnavailable(format!(
                    "invalid current price {} for symbol {}",
                    self.current, symbol
                ))
            })?;

        let aux = |value: f64| price_from_f64(value).unwrap_or(Price::ZERO);

        Ok(Quote {
            symbol: symbol.to_string(),
            current,
            high: aux(self.high),
            low: aux(self.low),
            open: aux(self.open),
            previous_close: aux(self.previous_close),
            fetched_at: Utc::now(),
        })
    }
}

/// Quote provider backed by the Finnhub REST API
#[derive(Clone)]
pub struct FinnhubQuoteProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FinnhubQuoteProvider {
    /// Create a provider from configuration; the API key is mandatory
    pub fn new(config: &QuoteProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::ConfigurationError("FINNHUB_API_KEY must be set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl QuoteProvider for FinnhubQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)
            .map_err(|e| Error::QuoteUnavailable(e.to_string()))?;
        let url = format!("{}/quote", self.base_url);
        debug!("Fetching quote for {}", symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.as_str()), ("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                warn!("Quote request for {} failed: {}", symbol, e);
                Error::QuoteUnavailable(format!("request for {} failed: {}", symbol, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Quote request for {} returned {}", symbol, status);
            return Err(Error::QuoteUnavailable(format!(
                "upstream returned {} for {}",
                status, symbol
            )));
        }

        let body = response
            .json::<FinnhubQuote>()
            .await
            .map_err(|e| Error::QuoteUnavailable(format!("malformed quote for {}: {}", symbol, e)))?;

        body.into_quote(&symbol)
    }
}
