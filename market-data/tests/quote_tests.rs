use common::decimal::dec;
use common::error::Error;
use market_data::{FinnhubQuote, FinnhubQuoteProvider, QuoteProvider, QuoteProviderConfig, StaticQuoteProvider};

#[tokio::test]
async fn test_static_provider_returns_price() {
    let provider = StaticQuoteProvider::with_prices([("AAPL", dec!(150)), ("msft", dec!(410.5))]);

    let quote = provider.get_quote("aapl").await.unwrap();
    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.current, dec!(150));

    let quote = provider.get_quote("MSFT").await.unwrap();
    assert_eq!(quote.current, dec!(410.5));
}

#[tokio::test]
async fn test_static_provider_unknown_symbol() {
    let provider = StaticQuoteProvider::new();
    match provider.get_quote("NOPE").await {
        Err(Error::QuoteUnavailable(_)) => (),
        other => panic!("Expected QuoteUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_static_provider_rejects_zero_price() {
    let provider = StaticQuoteProvider::with_prices([("ZERO", dec!(0))]);
    assert!(matches!(provider.get_quote("ZERO").await, Err(Error::QuoteUnavailable(_))));
}

#[tokio::test]
async fn test_static_provider_price_updates() {
    let provider = StaticQuoteProvider::with_prices([("AAPL", dec!(150))]);
    provider.set_price("AAPL", dec!(160));
    assert_eq!(provider.get_quote("AAPL").await.unwrap().current, dec!(160));

    provider.remove("AAPL");
    assert!(provider.get_quote("AAPL").await.is_err());
}

#[test]
fn test_finnhub_payload_conversion() {
    let raw: FinnhubQuote =
        serde_json::from_str(r#"{"c":150.25,"h":151.0,"l":148.5,"o":149.0,"pc":148.75,"t":1700000000}"#).unwrap();
    let quote = raw.into_quote("AAPL").unwrap();

    assert_eq!(quote.current, dec!(150.25));
    assert_eq!(quote.high, dec!(151));
    assert_eq!(quote.low, dec!(148.5));
    assert_eq!(quote.previous_close, dec!(148.75));
}

#[test]
fn test_finnhub_unknown_symbol_payload_is_rejected() {
    let raw: FinnhubQuote = serde_json::from_str(r#"{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}"#).unwrap();
    assert!(matches!(raw.into_quote("XXXX"), Err(Error::QuoteUnavailable(_))));
}

#[test]
fn test_finnhub_requires_api_key() {
    let config = QuoteProviderConfig {
        api_key: None,
        ..QuoteProviderConfig::default()
    };
    assert!(matches!(FinnhubQuoteProvider::new(&config), Err(Error::ConfigurationError(_))));
}
