//! Account models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Price, Shares};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// A holding of one symbol with its weighted-average cost basis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Position {
    /// Uppercase ticker symbol
    pub symbol: String,
    /// Shares held, always greater than zero
    pub quantity: Shares,
    /// Quantity-weighted average purchase price
    pub average_price: Price,
}

/// Account model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Cash balance, never negative
    pub balance: Amount,
    /// Positions sorted by symbol, at most one per symbol
    pub holdings: Vec<Position>,
    /// Incremented on every persisted update
    pub version: i64,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account with an opening cash balance
    pub fn new(balance: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            balance,
            holdings: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Find the position for a symbol
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.holdings.iter().find(|p| p.symbol == symbol)
    }

    /// Insert or replace the position for its symbol, keeping holdings sorted.
    /// A zero-quantity position removes the symbol instead.
    pub fn upsert_position(&mut self, position: Position) {
        match self.holdings.binary_search_by(|p| p.symbol.cmp(&position.symbol)) {
            Ok(index) if position.quantity == 0 => {
                self.holdings.remove(index);
            }
            Ok(index) => self.holdings[index] = position,
            Err(_) if position.quantity == 0 => {}
            Err(index) => self.holdings.insert(index, position),
        }
    }

    /// Balance and holdings view
    pub fn portfolio(&self) -> Portfolio {
        Portfolio {
            account_id: self.id,
            balance: self.balance,
            holdings: self.holdings.clone(),
        }
    }
}

/// Balance and holdings of an account as shown to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Portfolio {
    /// Account ID
    pub account_id: Uuid,
    /// Cash balance
    pub balance: Amount,
    /// Current positions
    pub holdings: Vec<Position>,
}

/// Login credentials stored next to an account. Never sent to clients.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Owning account
    pub account_id: Uuid,
    /// Normalized (trimmed, lower-case) e-mail address
    pub email: String,
    /// Argon2 PHC string of the password
    pub password_hash: String,
    /// Argon2 PHC string of the trading PIN
    pub pin_hash: String,
}

/// Input for creating an account together with its credentials
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub opening_balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    fn position(symbol: &str, quantity: Shares) -> Position {
        Position {
            symbol: symbol.to_string(),
            quantity,
            average_price: dec!(10),
        }
    }

    #[test]
    fn upsert_keeps_symbols_sorted_and_unique() {
        let mut account = Account::new(dec!(100));
        account.upsert_position(position("MSFT", 1));
        account.upsert_position(position("AAPL", 2));
        account.upsert_position(position("MSFT", 5));

        let symbols: Vec<_> = account.holdings.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(account.position("MSFT").unwrap().quantity, 5);
    }

    #[test]
    fn zero_quantity_removes_position() {
        let mut account = Account::new(dec!(100));
        account.upsert_position(position("AAPL", 2));
        account.upsert_position(position("AAPL", 0));
        assert!(account.holdings.is_empty());

        account.upsert_position(position("TSLA", 0));
        assert!(account.position("TSLA").is_none());
    }
}
