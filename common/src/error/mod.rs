//! Error types for the brokerage backend
//!
//! This module provides a unified error handling system for every crate in
//! the workspace. Each variant is scoped to a single request; none of them is
//! fatal to the process.

use std::fmt::Display;
use thiserror::Error;

/// Brokerage error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed symbol, quantity, action or other caller input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Cash balance does not cover a buy
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Position is smaller than the requested sell quantity
    #[error("Insufficient shares: {0}")]
    InsufficientShares(String),

    /// Sell of a symbol that is not held
    #[error("No such position: {0}")]
    NoSuchPosition(String),

    /// Quote provider failed, timed out or returned an unusable price
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Storage failed after the trade was computed; nothing was written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Unique resource already exists (e.g. an e-mail address)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Credentials, PIN or session token rejected
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is a business-rule rejection of a trade
    pub fn is_trade_rejection(&self) -> bool {
        matches!(
            self,
            Error::InsufficientFunds(_) | Error::InsufficientShares(_) | Error::NoSuchPosition(_)
        )
    }

    /// Whether the error originates in the storage layer
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Error::Persistence(_) | Error::Database(_) | Error::Migration(_) | Error::Internal(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InsufficientFunds(msg) => Error::InsufficientFunds(format!("{}: {}", context, msg)),
                Error::InsufficientShares(msg) => Error::InsufficientShares(format!("{}: {}", context, msg)),
                Error::NoSuchPosition(msg) => Error::NoSuchPosition(format!("{}: {}", context, msg)),
                Error::QuoteUnavailable(msg) => Error::QuoteUnavailable(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::Persistence(msg) => Error::Persistence(format!("{}: {}", context, msg)),
                Error::AlreadyExists(msg) => Error::AlreadyExists(format!("{}: {}", context, msg)),
                Error::AuthenticationError(msg) => Error::AuthenticationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prefixed_and_variant_kept() {
        let result: Result<()> = Err(Error::NoSuchPosition("AAPL".to_string()));
        let err = result.with_context(|| "sell rejected").unwrap_err();
        match err {
            Error::NoSuchPosition(msg) => assert_eq!(msg, "sell rejected: AAPL"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn classification() {
        assert!(Error::InsufficientFunds(String::new()).is_trade_rejection());
        assert!(!Error::QuoteUnavailable(String::new()).is_trade_rejection());
        assert!(Error::Persistence(String::new()).is_storage_failure());
        assert!(!Error::AccountNotFound(String::new()).is_storage_failure());
    }
}
