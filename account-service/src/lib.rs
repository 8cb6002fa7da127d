//! Account service: durable account state, the trade log and history queries

pub mod service;
pub mod repository;
pub mod config;
pub mod history;

pub use service::AccountService;
pub use service::RepositoryType;
pub use repository::{
    AccountMutator, AccountRepository, AccountUpdate, InMemoryAccountRepository,
    PostgresAccountRepository,
};
pub use history::{HistoryParams, HistoryQuery, SortField, SortOrder, TransactionFilter};
pub use config::AccountServiceConfig;
