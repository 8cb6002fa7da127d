use chrono::Utc;
use common::decimal::{dec, Amount, Price, Shares};
use common::error::Error;
use common::model::account::{Account, Position};
use common::model::transaction::TradeAction;
use trade_engine::ledger::apply;
use trade_engine::Order;

fn order(symbol: &str, quantity: Shares, action: TradeAction) -> Order {
    Order {
        symbol: symbol.to_string(),
        quantity,
        action,
    }
}

fn trade(account: &Account, symbol: &str, quantity: Shares, action: TradeAction, price: Price) -> Account {
    apply(account, &order(symbol, quantity, action), price, Utc::now())
        .unwrap()
        .account
}

#[test]
fn test_buy_opens_position() {
    let account = Account::new(dec!(10000));
    let update = apply(&account, &order("AAPL", 10, TradeAction::Buy), dec!(150), Utc::now()).unwrap();

    assert_eq!(update.account.balance, dec!(8500));
    assert_eq!(
        update.account.holdings,
        vec![Position {
            symbol: "AAPL".to_string(),
            quantity: 10,
            average_price: dec!(150),
        }]
    );

    let tx = update.transaction;
    assert_eq!(tx.account_id, account.id);
    assert_eq!(tx.action, TradeAction::Buy);
    assert_eq!(tx.price, dec!(150));
    assert_eq!(tx.total_cost, dec!(1500));

    // Input is untouched
    assert_eq!(account.balance, dec!(10000));
    assert!(account.holdings.is_empty());
}

#[test]
fn test_worked_example() {
    let account = Account::new(dec!(10000));

    let account = trade(&account, "AAPL", 10, TradeAction::Buy, dec!(150));
    assert_eq!(account.balance, dec!(8500));

    let account = trade(&account, "AAPL", 5, TradeAction::Buy, dec!(160));
    assert_eq!(account.balance, dec!(7700));
    let position = account.position("AAPL").unwrap();
    assert_eq!(position.quantity, 15);
    assert_eq!(position.average_price, dec!(153.33333333));

    let account = trade(&account, "AAPL", 15, TradeAction::Sell, dec!(170));
    assert_eq!(account.balance, dec!(10250));
    assert!(account.holdings.is_empty());
}

#[test]
fn test_partial_sell_keeps_average() {
    let account = Account::new(dec!(1000));
    let account = trade(&account, "MSFT", 4, TradeAction::Buy, dec!(100));
    let account = trade(&account, "MSFT", 4, TradeAction::Buy, dec!(50));
    let account = trade(&account, "MSFT", 3, TradeAction::Sell, dec!(10));

    let position = account.position("MSFT").unwrap();
    assert_eq!(position.quantity, 5);
    assert_eq!(position.average_price, dec!(75));
    assert_eq!(account.balance, dec!(430));
}

#[test]
fn test_buy_exact_balance() {
    let account = Account::new(dec!(300));
    let account = trade(&account, "TSLA", 3, TradeAction::Buy, dec!(100));
    assert_eq!(account.balance, Amount::ZERO);
    assert_eq!(account.position("TSLA").unwrap().quantity, 3);
}

#[test]
fn test_insufficient_funds() {
    let account = Account::new(dec!(100));
    let result = apply(&account, &order("AAPL", 1, TradeAction::Buy), dec!(100.01), Utc::now());
    assert!(matches!(result, Err(Error::InsufficientFunds(_))));
}

#[test]
fn test_sell_without_position() {
    let account = Account::new(dec!(100));
    let result = apply(&account, &order("AAPL", 1, TradeAction::Sell), dec!(10), Utc::now());
    assert!(matches!(result, Err(Error::NoSuchPosition(_))));
}

#[test]
fn test_sell_more_than_held() {
    let account = trade(&Account::new(dec!(100)), "AAPL", 2, TradeAction::Buy, dec!(10));
    let result = apply(&account, &order("AAPL", 3, TradeAction::Sell), dec!(10), Utc::now());
    assert!(matches!(result, Err(Error::InsufficientShares(_))));
}

#[test]
fn test_invalid_inputs() {
    let account = Account::new(dec!(100));
    for (order, price) in [
        (order("AAPL", 0, TradeAction::Buy), dec!(10)),
        (order("", 1, TradeAction::Buy), dec!(10)),
        (order("AAPL", 1, TradeAction::Buy), dec!(0)),
        (order("AAPL", 1, TradeAction::Sell), dec!(-5)),
    ] {
        let result = apply(&account, &order, price, Utc::now());
        assert!(matches!(result, Err(Error::ValidationError(_))), "{:?} @ {}", order, price);
    }
}

#[test]
fn test_holdings_stay_sorted() {
    let mut account = Account::new(dec!(10000));
    for symbol in ["TSLA", "AAPL", "MSFT"] {
        account = trade(&account, symbol, 1, TradeAction::Buy, dec!(10));
    }
    let symbols: Vec<_> = account.holdings.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA"]);
}

#[test]
fn test_arithmetic_overflow_is_rejected() {
    let account = Account::new(Price::MAX);
    let result = apply(&account, &order("AAPL", 2, TradeAction::Buy), Price::MAX, Utc::now());
    assert!(matches!(result, Err(Error::ValidationError(msg)) if msg.contains("overflows")));
    assert_eq!(account.balance, Price::MAX);
}
