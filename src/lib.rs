// This is a metapackage for tests
// Re-export crates as modules

pub use account_service;
pub use api_gateway;
pub use common;
pub use identity_service;
pub use market_data;
pub use trade_engine;
