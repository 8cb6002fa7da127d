//! Account service implementation

use std::sync::Arc;

use common::db::DbPool;
use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, Credentials, NewAccount, Portfolio};
use common::model::transaction::Transaction;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{AccountServiceConfig, DEFAULT_OPENING_BALANCE};
use crate::history::HistoryQuery;
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Account service: account lifecycle, portfolio and history views
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// Cash credited to new accounts
    opening_balance: Amount,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository on an existing pool
    Postgres(DbPool),
}

impl AccountService {
    /// Create a new account service backed by memory
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryAccountRepository::new()),
            opening_balance: Amount::from(DEFAULT_OPENING_BALANCE),
        }
    }

    /// Create a new account service with a specific repository type
    pub fn with_repository(repo_type: RepositoryType, config: &AccountServiceConfig) -> Self {
        let repo: Arc<dyn AccountRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryAccountRepository::new()),
            RepositoryType::Postgres(pool) => {
                Arc::new(PostgresAccountRepository::new(pool, config.transaction_logging))
            }
        };

        Self::from_repository(repo, config.opening_balance)
    }

    /// Wrap an already constructed repository
    pub fn from_repository(repo: Arc<dyn AccountRepository>, opening_balance: Amount) -> Self {
        Self {
            repo,
            opening_balance,
        }
    }

    /// Shared handle to the underlying repository
    pub fn repository(&self) -> Arc<dyn AccountRepository> {
        self.repo.clone()
    }

    /// Open an account for verified credentials, credited with the opening balance
    pub async fn open_account(&self, email: String, password_hash: String, pin_hash: String) -> Result<Account> {
        info!("Opening account for {}", email);
        let account = self
            .repo
            .create_account(NewAccount {
                email,
                password_hash,
                pin_hash,
                opening_balance: self.opening_balance,
            })
            .await?;
        info!("Opened account {} with balance {}", account.id, account.balance);
        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.repo.get_account(id).await
    }

    /// Balance and holdings of an account
    pub async fn get_portfolio(&self, account_id: Uuid) -> Result<Portfolio> {
        let account = self
            .repo
            .get_account(account_id)
            .await
            .with_context(|| format!("Failed to retrieve account {}", account_id))?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        Ok(account.portfolio())
    }

    /// Filtered and sorted transaction history of an account
    pub async fn get_history(&self, account_id: Uuid, query: &HistoryQuery) -> Result<Vec<Transaction>> {
        debug!("History query for account {}: {:?}", account_id, query);

        if self.repo.get_account(account_id).await?.is_none() {
            return Err(Error::AccountNotFound(format!("Account not found: {}", account_id)));
        }

        let mut transactions = self
            .repo
            .transactions(account_id, &query.filter)
            .await
            .with_context(|| format!("Failed to load transactions for account {}", account_id))?;

        query.sort(&mut transactions);
        Ok(transactions)
    }

    /// Credentials by normalized e-mail
    pub async fn find_credentials_by_email(&self, email: &str) -> Result<Option<Credentials>> {
        self.repo.find_credentials_by_email(email).await
    }

    /// Credentials of an account
    pub async fn get_credentials(&self, account_id: Uuid) -> Result<Option<Credentials>> {
        self.repo.get_credentials(account_id).await
    }
}

impl Default for AccountService {
    fn default() -> Self {
        Self::new()
    }
}
