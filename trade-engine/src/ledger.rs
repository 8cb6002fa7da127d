//! Portfolio ledger
//!
//! Pure buy/sell rules over an account snapshot. [`apply`] never touches
//! storage and never mutates its input; it returns the next account state and
//! the transaction that explains it, or the reason the trade is rejected.
//!
//! Buys fold into the existing position with a quantity-weighted average price.
//! Sells reduce the position at the execution price and leave the average
//! untouched; a position that reaches zero shares is removed.

use account_service::AccountUpdate;
use chrono::{DateTime, Utc};
use common::decimal::precision::round_price;
use common::decimal::{Amount, Price};
use common::error::{Error, Result};
use common::model::account::{Account, Position};
use common::model::transaction::{TradeAction, Transaction};

use crate::order::Order;

fn overflow(what: &str) -> Error {
    Error::ValidationError(format!("{} overflows", what))
}

/// Apply one order at `quote_price` to `account`
pub fn apply(
    account: &Account,
    order: &Order,
    quote_price: Price,
    executed_at: DateTime<Utc>,
) -> Result<AccountUpdate> {
    if order.quantity == 0 {
        return Err(Error::ValidationError("quantity must be positive".to_string()));
    }
    if order.symbol.is_empty() {
        return Err(Error::ValidationError("symbol must not be empty".to_string()));
    }
    if quote_price <= Price::ZERO {
        return Err(Error::ValidationError(format!(
            "quote price must be positive, got {}",
            quote_price
        )));
    }

    let total_cost = quote_price
        .checked_mul(Amount::from(order.quantity))
        .ok_or_else(|| overflow("total cost"))?;

    let mut next = account.clone();
    match order.action {
        TradeAction::Buy => buy(&mut next, order, quote_price, total_cost)?,
        TradeAction::Sell => sell(&mut next, order, total_cost)?,
    }

    let transaction = Transaction::new(
        account.id,
        order.symbol.clone(),
        order.action,
        order.quantity,
        quote_price,
        executed_at,
    );

    Ok(AccountUpdate {
        account: next,
        transaction,
    })
}

fn buy(account: &mut Account, order: &Order, quote_price: Price, total_cost: Amount) -> Result<()> {
    if account.balance < total_cost {
        return Err(Error::InsufficientFunds(format!(
            "buying {} {} costs {} but the balance is {}",
            order.quantity, order.symbol, total_cost, account.balance
        )));
    }

    let position = match account.position(&order.symbol) {
        Some(held) => {
            let quantity = held
                .quantity
                .checked_add(order.quantity)
                .ok_or_else(|| overflow("position quantity"))?;
            let held_cost = held
                .average_price
                .checked_mul(Amount::from(held.quantity))
                .and_then(|cost| cost.checked_add(total_cost))
                .ok_or_else(|| overflow("position cost"))?;
            let average_price = held_cost
                .checked_div(Amount::from(quantity))
                .ok_or_else(|| overflow("average price"))?;

            Position {
                symbol: order.symbol.clone(),
                quantity,
                average_price: round_price(average_price),
            }
        }
        None => Position {
            symbol: order.symbol.clone(),
            quantity: order.quantity,
            average_price: quote_price,
        },
    };

    account.balance -= total_cost;
    account.upsert_position(position);
    Ok(())
}

fn sell(account: &mut Account, order: &Order, total_cost: Amount) -> Result<()> {
    let held = account
        .position(&order.symbol)
        .cloned()
        .ok_or_else(|| Error::NoSuchPosition(format!("no position in {}", order.symbol)))?;

    if held.quantity < order.quantity {
        return Err(Error::InsufficientShares(format!(
            "selling {} {} but only {} held",
            order.quantity, order.symbol, held.quantity
        )));
    }

    account.balance = account
        .balance
        .checked_add(total_cost)
        .ok_or_else(|| overflow("balance"))?;
    account.upsert_position(Position {
        quantity: held.quantity - order.quantity,
        ..held
    });
    Ok(())
}
