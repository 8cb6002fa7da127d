use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::decimal::Shares;
use crate::error::{Error, Result};
use crate::model::account::{Account, Credentials, Position};
use crate::model::transaction::{TradeAction, Transaction};

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub balance: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbAccount {
    /// Build the domain account from the row and its position rows
    pub fn into_account(self, positions: Vec<DbPosition>) -> Result<Account> {
        let holdings = positions
            .into_iter()
            .map(DbPosition::into_position)
            .collect::<Result<Vec<_>>>()?;

        Ok(Account {
            id: self.id,
            balance: self.balance,
            holdings,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            account_id: self.id,
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            pin_hash: self.pin_hash.clone(),
        }
    }
}

/// Database model for the positions table
#[derive(Debug, Clone, FromRow)]
pub struct DbPosition {
    pub account_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub average_price: Decimal,
}

impl DbPosition {
    pub fn into_position(self) -> Result<Position> {
        Ok(Position {
            quantity: shares_from_db(self.quantity)?,
            symbol: self.symbol,
            average_price: self.average_price,
        })
    }
}

/// Database model for the transactions table
#[derive(Debug, Clone, FromRow)]
pub struct DbTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub action: String,
    pub quantity: i64,
    pub price: Decimal,
    pub total_cost: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl TryFrom<DbTransaction> for Transaction {
    type Error = Error;

    fn try_from(row: DbTransaction) -> Result<Self> {
        let action: TradeAction = row
            .action
            .parse()
            .map_err(|_| Error::Internal(format!("Invalid stored action: {}", row.action)))?;

        Ok(Transaction {
            id: row.id,
            account_id: row.account_id,
            symbol: row.symbol,
            action,
            quantity: shares_from_db(row.quantity)?,
            price: row.price,
            total_cost: row.total_cost,
            executed_at: row.executed_at,
        })
    }
}

/// Database model for the pending_signups table
#[derive(Debug, Clone, FromRow)]
pub struct DbPendingSignup {
    pub email: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub otp: String,
    pub failed_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

fn shares_from_db(value: i64) -> Result<Shares> {
    Shares::try_from(value).map_err(|_| Error::Internal(format!("Invalid stored share quantity: {}", value)))
}
