//! Repository for account data and the transaction log

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::{Account, Credentials, NewAccount};
use common::model::transaction::Transaction;
use common::db::models::{DbAccount, DbPosition, DbTransaction};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::history::TransactionFilter;

/// New account state plus the transaction that produced it, persisted as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub account: Account,
    pub transaction: Transaction,
}

/// Computes the next account state from the current one.
/// Returning an error aborts the update without writing anything.
pub type AccountMutator<'a> = dyn Fn(&Account) -> Result<AccountUpdate> + Send + Sync + 'a;

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account together with its credentials
    async fn create_account(&self, new_account: NewAccount) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Look up credentials by normalized e-mail
    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<Credentials>>;

    /// Get the credentials of an account
    async fn get_credentials(&self, account_id: Uuid) -> Result<Option<Credentials>>;

    /// Load the account, apply `mutator`, then persist the new account state and
    /// append the transaction atomically. Either both land or neither does.
    async fn atomic_update(&self, account_id: Uuid, mutator: &AccountMutator<'_>) -> Result<AccountUpdate>;

    /// Transactions of an account matching `filter`, in execution order
    async fn transactions(&self, account_id: Uuid, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
}

/// Reject states the durable schema would refuse
fn check_account_state(account: &Account) -> Result<()> {
    if account.balance < Amount::ZERO {
        return Err(Error::Persistence(format!(
            "balance of account {} would become negative",
            account.id
        )));
    }
    if account.holdings.iter().any(|p| p.quantity == 0) {
        return Err(Error::Persistence(format!(
            "account {} would store an empty position",
            account.id
        )));
    }
    if account.holdings.windows(2).any(|w| w[0].symbol >= w[1].symbol) {
        return Err(Error::Persistence(format!(
            "account {} holdings are not unique by symbol",
            account.id
        )));
    }
    Ok(())
}

/// Account state and credentials kept side by side in memory
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account: Account,
    pub credentials: Credentials,
}

/// In-memory repository for account data
#[derive(Default)]
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, AccountRecord>,
    /// Account IDs by normalized e-mail
    emails: DashMap<String, Uuid>,
    /// Transaction log by account ID, in execution order
    pub transactions: DashMap<Uuid, Vec<Transaction>>,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        match self.emails.entry(new_account.email.clone()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists(format!(
                "account for {} already exists",
                new_account.email
            ))),
            Entry::Vacant(slot) => {
                let account = Account::new(new_account.opening_balance);
                let credentials = Credentials {
                    account_id: account.id,
                    email: new_account.email,
                    password_hash: new_account.password_hash,
                    pin_hash: new_account.pin_hash,
                };
                self.accounts.insert(
                    account.id,
                    AccountRecord {
                        account: account.clone(),
                        credentials,
                    },
                );
                slot.insert(account.id);
                Ok(account)
            }
        }
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|r| r.account.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_credentials(id).await
    }

    async fn get_credentials(&self, account_id: Uuid) -> Result<Option<Credentials>> {
        Ok(self.accounts.get(&account_id).map(|r| r.credentials.clone()))
    }

    async fn atomic_update(&self, account_id: Uuid, mutator: &AccountMutator<'_>) -> Result<AccountUpdate> {
        // The shard guard is held for the whole read-modify-write.
        let mut record = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        let mut update = mutator(&record.account)?;
        check_account_state(&update.account)?;

        update.account.version = record.account.version + 1;
        update.account.updated_at = Utc::now();

        self.transactions
            .entry(account_id)
            .or_default()
            .push(update.transaction.clone());
        record.account = update.account.clone();

        Ok(update)
    }

    async fn transactions(&self, account_id: Uuid, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .get(&account_id)
            .map(|log| log.iter().filter(|tx| filter.matches(tx)).cloned().collect())
            .unwrap_or_default())
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, pin_hash, balance, version, created_at, updated_at";

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: PgPool,
    /// Enable transaction logging
    transaction_logging: bool,
}

impl PostgresAccountRepository {
    /// Create a new PostgreSQL account repository on an existing pool
    pub fn new(pool: PgPool, transaction_logging: bool) -> Self {
        Self {
            pool,
            transaction_logging,
        }
    }

    async fn load_positions<'e, E>(executor: E, account_id: Uuid) -> Result<Vec<DbPosition>>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DbPosition>(
            "SELECT account_id, symbol, quantity, average_price
             FROM positions
             WHERE account_id = $1
             ORDER BY symbol",
        )
        .bind(account_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        debug!("Creating new account in database for {}", new_account.email);

        let account = Account::new(new_account.opening_balance);
        let result = sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, pin_hash, balance, version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(account.id)
        .bind(&new_account.email)
        .bind(&new_account.password_hash)
        .bind(&new_account.pin_hash)
        .bind(account.balance)
        .bind(account.version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AlreadyExists(format!(
                "account for {} already exists",
                new_account.email
            )));
        }

        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let positions = Self::load_positions(&self.pool, id).await?;
                Ok(Some(row.into_account(positions)?))
            }
            None => Ok(None),
        }
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.credentials()))
    }

    async fn get_credentials(&self, account_id: Uuid) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.credentials()))
    }

    async fn atomic_update(&self, account_id: Uuid, mutator: &AccountMutator<'_>) -> Result<AccountUpdate> {
        // Any early return drops `tx`, which rolls the transaction back.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        let positions = Self::load_positions(&mut *tx, account_id).await?;
        let current = row.into_account(positions)?;

        let mut update = mutator(&current)?;
        check_account_state(&update.account)?;
        update.account.version = current.version + 1;
        update.account.updated_at = Utc::now();

        let updated = sqlx::query(
            "UPDATE accounts SET balance = $1, version = $2, updated_at = $3
             WHERE id = $4 AND version = $5",
        )
        .bind(update.account.balance)
        .bind(update.account.version)
        .bind(update.account.updated_at)
        .bind(account_id)
        .bind(current.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            return Err(Error::Persistence(format!(
                "account {} was modified concurrently",
                account_id
            )));
        }

        sqlx::query("DELETE FROM positions WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        for position in &update.account.holdings {
            sqlx::query(
                "INSERT INTO positions (account_id, symbol, quantity, average_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(account_id)
            .bind(&position.symbol)
            .bind(i64::from(position.quantity))
            .bind(position.average_price)
            .execute(&mut *tx)
            .await?;
        }

        let t = &update.transaction;
        sqlx::query(
            "INSERT INTO transactions (id, account_id, symbol, action, quantity, price, total_cost, executed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(t.id)
        .bind(t.account_id)
        .bind(&t.symbol)
        .bind(t.action.as_str())
        .bind(i64::from(t.quantity))
        .bind(t.price)
        .bind(t.total_cost)
        .bind(t.executed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if self.transaction_logging {
            info!(
                "Recorded transaction {} for account {}: {} {} {} @ {}",
                t.id, account_id, t.action, t.quantity, t.symbol, t.price
            );
        }

        Ok(update)
    }

    async fn transactions(&self, account_id: Uuid, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        debug!("Querying transactions for account {}: {:?}", account_id, filter);

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, account_id, symbol, action, quantity, price, total_cost, executed_at
             FROM transactions WHERE account_id = ",
        );
        query.push_bind(account_id);

        if let Some(symbol) = &filter.symbol {
            query.push(" AND symbol = ").push_bind(symbol.clone());
        }
        if let Some(action) = filter.action {
            query.push(" AND action = ").push_bind(action.as_str());
        }
        if let Some(min) = filter.min_quantity {
            query.push(" AND quantity >= ").push_bind(i64::from(min));
        }
        if let Some(max) = filter.max_quantity {
            query.push(" AND quantity <= ").push_bind(i64::from(max));
        }
        if let Some(min) = filter.min_price {
            query.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND price <= ").push_bind(max);
        }
        query.push(" ORDER BY seq");

        let rows = query
            .build_query_as::<DbTransaction>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
