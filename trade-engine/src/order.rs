use common::decimal::Shares;
use common::error::{Error, Result};
use common::model::normalize_symbol;
use common::model::transaction::TradeAction;
use serde::{Deserialize, Serialize};

/// Trade as submitted by a client, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct TradeRequest {
    /// Ticker symbol, any case
    pub symbol: String,
    /// Number of whole shares
    pub quantity: i64,
    /// "buy" or "sell", any case
    pub action: String,
}

/// Validated trade: normalized symbol, positive quantity, parsed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub symbol: String,
    pub quantity: Shares,
    pub action: TradeAction,
}

impl TryFrom<&TradeRequest> for Order {
    type Error = Error;

    fn try_from(request: &TradeRequest) -> Result<Self> {
        let symbol = normalize_symbol(&request.symbol)?;

        if request.quantity <= 0 {
            return Err(Error::ValidationError(format!(
                "quantity must be a positive integer, got {}",
                request.quantity
            )));
        }
        let quantity = Shares::try_from(request.quantity).map_err(|_| {
            Error::ValidationError(format!("quantity {} is too large", request.quantity))
        })?;

        let action = request.action.parse::<TradeAction>()?;

        Ok(Self {
            symbol,
            quantity,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(symbol: &str, quantity: i64, action: &str) -> TradeRequest {
        TradeRequest {
            symbol: symbol.to_string(),
            quantity,
            action: action.to_string(),
        }
    }

    #[test]
    fn request_is_normalized() {
        let order = Order::try_from(&request(" aapl ", 3, "BUY")).unwrap();
        assert_eq!(
            order,
            Order {
                symbol: "AAPL".to_string(),
                quantity: 3,
                action: TradeAction::Buy,
            }
        );
    }

    #[test]
    fn invalid_requests() {
        for bad in [
            request("", 1, "buy"),
            request("AAPL", 0, "buy"),
            request("AAPL", -4, "sell"),
            request("AAPL", i64::MAX, "buy"),
            request("AAPL", 1, "hold"),
            request("AA PL", 1, "buy"),
        ] {
            assert!(
                matches!(Order::try_from(&bad), Err(Error::ValidationError(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
