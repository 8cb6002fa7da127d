//! Stock quotes

use std::sync::Arc;

use axum::extract::{Query, State};
use axum_extra::extract::WithRejection;
use common::model::Quote;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::response::ApiResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// Price query
#[derive(Debug, Deserialize, IntoParams)]
pub struct PriceQuery {
    /// Ticker symbol, any case
    pub symbol: Option<String>,
}

/// Current quote for a symbol
#[utoipa::path(
    get,
    path = "/api/v1/stocks/price",
    params(PriceQuery),
    responses(
        (status = 200, description = "Current quote", body = Quote),
        (status = 400, description = "Missing or invalid symbol", body = ErrorResponse),
        (status = 503, description = "Quote provider unavailable", body = ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn get_price(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<PriceQuery>, ApiError>,
) -> Result<ApiResponse<Quote>, ApiError> {
    let symbol = query
        .symbol
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("symbol is required".to_string()))?;

    let quote = state.executor.quote(&symbol).await?;
    Ok(ApiResponse::new(quote))
}
