//! Trade submission and history

use std::sync::Arc;

use account_service::{HistoryParams, HistoryQuery};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::WithRejection;
use common::model::transaction::Transaction;
use trade_engine::TradeRequest;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::AuthenticatedAccount;
use crate::AppState;

/// Buy or sell at the current market price
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = TradeRequest,
    responses(
        (status = 201, description = "Trade executed", body = Transaction),
        (status = 400, description = "Invalid request or trade rejected", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 503, description = "No quote available", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "transactions"
)]
pub async fn submit_trade(
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    WithRejection(Json(request), _): WithRejection<Json<TradeRequest>, ApiError>,
) -> Result<(StatusCode, ApiResponse<Transaction>), ApiError> {
    let transaction = state.executor.execute(account_id, &request).await?;
    Ok((StatusCode::CREATED, ApiResponse::new(transaction)))
}

/// Filtered and sorted transaction history
#[utoipa::path(
    get,
    path = "/api/v1/transactions/history",
    params(
        ("symbol" = Option<String>, Query, description = "Only this symbol, any case"),
        ("action" = Option<String>, Query, description = "buy or sell"),
        ("minQuantity" = Option<u32>, Query, description = "Inclusive lower quantity bound"),
        ("maxQuantity" = Option<u32>, Query, description = "Inclusive upper quantity bound"),
        ("minPrice" = Option<String>, Query, description = "Inclusive lower price bound"),
        ("maxPrice" = Option<String>, Query, description = "Inclusive upper price bound"),
        ("sortBy" = Option<String>, Query, description = "symbol, quantity, price or totalCost"),
        ("sortOrder" = Option<String>, Query, description = "asc (default) or desc")
    ),
    responses(
        (status = 200, description = "Matching transactions", body = [Transaction]),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "transactions"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    WithRejection(Query(params), _): WithRejection<Query<HistoryParams>, ApiError>,
) -> Result<ApiListResponse<Transaction>, ApiError> {
    let query = HistoryQuery::from_params(&params)?;
    let transactions = state.account_service.get_history(account_id, &query).await?;
    Ok(ApiListResponse::new(transactions))
}
