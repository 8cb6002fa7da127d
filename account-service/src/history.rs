//! Transaction history filtering and sorting

use std::cmp::Ordering;

use common::decimal::{Price, Shares};
use common::error::{Error, Result};
use common::model::transaction::{TradeAction, Transaction};
use serde::Deserialize;

/// Predicate over an account's transaction log. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Uppercase symbol
    pub symbol: Option<String>,
    pub action: Option<TradeAction>,
    pub min_quantity: Option<Shares>,
    pub max_quantity: Option<Shares>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

impl TransactionFilter {
    /// Whether a transaction passes every set criterion
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.symbol.as_ref().map_or(true, |s| &tx.symbol == s)
            && self.action.map_or(true, |a| tx.action == a)
            && self.min_quantity.map_or(true, |q| tx.quantity >= q)
            && self.max_quantity.map_or(true, |q| tx.quantity <= q)
            && self.min_price.map_or(true, |p| tx.price >= p)
            && self.max_price.map_or(true, |p| tx.price <= p)
    }
}

/// Sortable transaction fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Symbol,
    Quantity,
    Price,
    TotalCost,
}

impl SortField {
    /// Parse a sort field name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "symbol" => Some(SortField::Symbol),
            "quantity" => Some(SortField::Quantity),
            "price" => Some(SortField::Price),
            "totalCost" | "total_cost" => Some(SortField::TotalCost),
            _ => None,
        }
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            SortField::Symbol => a.symbol.cmp(&b.symbol),
            SortField::Quantity => a.quantity.cmp(&b.quantity),
            SortField::Price => a.price.cmp(&b.price),
            SortField::TotalCost => a.total_cost.cmp(&b.total_cost),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than "desc" sorts ascending
    pub fn parse(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Raw history query as received from a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub symbol: Option<String>,
    pub action: Option<String>,
    pub min_quantity: Option<Shares>,
    pub max_quantity: Option<Shares>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Validated history query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub filter: TransactionFilter,
    /// `None` keeps execution order
    pub sort_by: Option<SortField>,
    pub order: SortOrder,
}

impl HistoryQuery {
    /// Validate raw parameters. An unknown sort field is ignored; a bad action is an error.
    pub fn from_params(params: &HistoryParams) -> Result<Self> {
        let symbol = params
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_ascii_uppercase);

        let action = match params.action.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(raw.parse::<TradeAction>()?),
            None => None,
        };

        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                return Err(Error::ValidationError(format!(
                    "minPrice {} exceeds maxPrice {}",
                    min, max
                )));
            }
        }

        Ok(Self {
            filter: TransactionFilter {
                symbol,
                action,
                min_quantity: params.min_quantity,
                max_quantity: params.max_quantity,
                min_price: params.min_price,
                max_price: params.max_price,
            },
            sort_by: params.sort_by.as_deref().and_then(SortField::parse),
            order: params.sort_order.as_deref().map(SortOrder::parse).unwrap_or_default(),
        })
    }

    /// Sort transactions in place. Stable, so ties keep execution order.
    pub fn sort(&self, transactions: &mut [Transaction]) {
        if let Some(field) = self.sort_by {
            transactions.sort_by(|a, b| {
                let ordering = field.compare(a, b);
                match self.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_field_is_ignored() {
        let params = HistoryParams {
            sort_by: Some("date".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        };
        let query = HistoryQuery::from_params(&params).unwrap();
        assert_eq!(query.sort_by, None);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn params_are_normalized() {
        let params = HistoryParams {
            symbol: Some(" aapl ".to_string()),
            action: Some("SELL".to_string()),
            sort_by: Some("totalCost".to_string()),
            ..Default::default()
        };
        let query = HistoryQuery::from_params(&params).unwrap();
        assert_eq!(query.filter.symbol.as_deref(), Some("AAPL"));
        assert_eq!(query.filter.action, Some(TradeAction::Sell));
        assert_eq!(query.sort_by, Some(SortField::TotalCost));
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn bad_action_is_rejected() {
        let params = HistoryParams {
            action: Some("hold".to_string()),
            ..Default::default()
        };
        assert!(matches!(HistoryQuery::from_params(&params), Err(Error::ValidationError(_))));
    }
}
