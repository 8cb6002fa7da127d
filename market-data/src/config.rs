//! Configuration for the quote providers

use std::env;
use std::fmt;
use std::time::Duration;

/// Default upstream endpoint
pub const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Configuration for the quote provider
#[derive(Clone)]
pub struct QuoteProviderConfig {
    /// Finnhub API key
    pub api_key: Option<String>,
    /// Finnhub REST base URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for QuoteProviderConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("FINNHUB_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: env::var("FINNHUB_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FINNHUB_BASE_URL.to_string()),
            timeout: Duration::from_millis(
                env::var("QUOTE_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5_000),
            ),
        }
    }
}

impl QuoteProviderConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }
}

impl fmt::Debug for QuoteProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
