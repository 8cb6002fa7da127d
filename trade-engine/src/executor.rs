//! Trade executor
//!
//! Validates a trade request, prices it with a live quote and applies it to
//! the account through the repository's atomic update. Trades on the same
//! account are serialized by a per-account async mutex; trades on different
//! accounts run in parallel.

use std::sync::Arc;
use std::time::Duration;

use account_service::AccountRepository;
use chrono::Utc;
use common::decimal::Price;
use common::error::{Error, Result};
use common::model::account::Account;
use common::model::transaction::Transaction;
use common::model::{normalize_symbol, Quote};
use dashmap::DashMap;
use market_data::QuoteProvider;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ledger;
use crate::order::{Order, TradeRequest};

/// Quote lookups that take longer than this fail the trade
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes trades against live quotes
pub struct TradeExecutor {
    accounts: Arc<dyn AccountRepository>,
    quotes: Arc<dyn QuoteProvider>,
    /// One mutex per account that ever traded; entries are never removed
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    quote_timeout: Duration,
}

impl TradeExecutor {
    /// Create a new executor
    pub fn new(accounts: Arc<dyn AccountRepository>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            accounts,
            quotes,
            locks: DashMap::new(),
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
        }
    }

    /// Override the quote timeout
    pub fn with_quote_timeout(mut self, quote_timeout: Duration) -> Self {
        self.quote_timeout = quote_timeout;
        self
    }

    /// Fetch a usable quote for a raw symbol within the configured timeout
    pub async fn quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;

        let quote = match timeout(self.quote_timeout, self.quotes.get_quote(&symbol)).await {
            Ok(Ok(quote)) => quote,
            Ok(Err(Error::QuoteUnavailable(msg))) => return Err(Error::QuoteUnavailable(msg)),
            Ok(Err(e)) => {
                return Err(Error::QuoteUnavailable(format!(
                    "quote for {} failed: {}",
                    symbol, e
                )))
            }
            Err(_) => {
                warn!("Quote for {} timed out after {:?}", symbol, self.quote_timeout);
                return Err(Error::QuoteUnavailable(format!(
                    "quote for {} timed out after {} ms",
                    symbol,
                    self.quote_timeout.as_millis()
                )));
            }
        };

        if quote.current <= Price::ZERO {
            return Err(Error::QuoteUnavailable(format!(
                "non-positive price {} for {}",
                quote.current, symbol
            )));
        }
        Ok(quote)
    }

    fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Execute a trade for an account.
    ///
    /// On success exactly one account update and one transaction are
    /// persisted; on any error nothing is.
    pub async fn execute(&self, account_id: Uuid, request: &TradeRequest) -> Result<Transaction> {
        let order = Order::try_from(request)?;
        debug!("Executing {:?} for account {}", order, account_id);

        let quote = self.quote(&order.symbol).await?;
        let price = quote.current;

        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let executed_at = Utc::now();
        let mutator = |account: &Account| ledger::apply(account, &order, price, executed_at);

        let update = match self.accounts.atomic_update(account_id, &mutator).await {
            Ok(update) => update,
            Err(e) if e.is_storage_failure() => {
                warn!("Trade for account {} not persisted: {}", account_id, e);
                return Err(match e {
                    Error::Persistence(msg) => Error::Persistence(msg),
                    other => Error::Persistence(other.to_string()),
                });
            }
            Err(e) => {
                if e.is_trade_rejection() {
                    info!("Trade for account {} rejected: {}", account_id, e);
                } else {
                    debug!("Trade for account {} failed: {}", account_id, e);
                }
                return Err(e);
            }
        };

        let tx = update.transaction;
        info!(
            "Executed {} {} {} @ {} for account {} (balance {})",
            tx.action, tx.quantity, tx.symbol, tx.price, account_id, update.account.balance
        );
        Ok(tx)
    }
}
