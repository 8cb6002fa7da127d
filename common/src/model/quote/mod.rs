//! Market quote snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Price;
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Current market price of a symbol. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Quote {
    /// Uppercase ticker symbol
    pub symbol: String,
    /// Current price, always greater than zero
    pub current: Price,
    /// Day high
    pub high: Price,
    /// Day low
    pub low: Price,
    /// Day open
    pub open: Price,
    /// Previous close
    pub previous_close: Price,
    /// When the quote was obtained
    pub fetched_at: DateTime<Utc>,
}

/// Longest accepted ticker symbol
pub const MAX_SYMBOL_LEN: usize = 16;

/// Trim and upper-case a ticker symbol, rejecting anything that cannot be one
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(Error::ValidationError("symbol must not be empty".to_string()));
    }
    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(Error::ValidationError(format!(
            "symbol longer than {} characters",
            MAX_SYMBOL_LEN
        )));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | ':'))
    {
        return Err(Error::ValidationError(format!("invalid symbol: {}", symbol)));
    }
    Ok(symbol.to_ascii_uppercase())
}

impl Quote {
    /// Quote where every field carries the same price
    pub fn flat(symbol: impl Into<String>, price: Price) -> Self {
        Self {
            symbol: symbol.into(),
            current: price,
            high: price,
            low: price,
            open: price,
            previous_close: price,
            fetched_at: Utc::now(),
        }
    }
}
