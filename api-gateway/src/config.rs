//! Application configuration

use std::env;

use account_service::AccountServiceConfig;
use identity_service::IdentityConfig;
use market_data::QuoteProviderConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API port
    pub port: u16,
    pub accounts: AccountServiceConfig,
    pub quotes: QuoteProviderConfig,
    pub identity: IdentityConfig,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            accounts: AccountServiceConfig::from_env(),
            quotes: QuoteProviderConfig::from_env(),
            identity: IdentityConfig::from_env(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
