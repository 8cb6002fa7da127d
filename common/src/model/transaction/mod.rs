//! Executed trade records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Price, Shares};
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(Error::ValidationError(format!(
                "action must be 'buy' or 'sell', got '{}'",
                other
            ))),
        }
    }
}

/// Immutable record of one executed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,
    /// Account that executed the trade
    pub account_id: Uuid,
    /// Uppercase ticker symbol
    pub symbol: String,
    /// Buy or sell
    pub action: TradeAction,
    /// Shares traded
    pub quantity: Shares,
    /// Execution price (the quote at execution time)
    pub price: Price,
    /// quantity * price
    pub total_cost: Amount,
    /// Execution timestamp
    pub executed_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction; `total_cost` is derived from price and quantity
    pub fn new(
        account_id: Uuid,
        symbol: String,
        action: TradeAction,
        quantity: Shares,
        price: Price,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            symbol,
            action,
            quantity,
            price,
            total_cost: price * Amount::from(quantity),
            executed_at,
        }
    }
}
