//! Portfolio and PIN checks for the signed-in account

use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use common::model::account::Portfolio;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::response::{ApiResponse, MessageData};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::AuthenticatedAccount;
use crate::AppState;

/// PIN check request
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPinRequest {
    pub pin: String,
}

/// Balance and holdings
#[utoipa::path(
    get,
    path = "/api/v1/user/portfolio",
    responses(
        (status = 200, description = "Portfolio", body = Portfolio),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "user"
)]
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
) -> Result<ApiResponse<Portfolio>, ApiError> {
    let portfolio = state.account_service.get_portfolio(account_id).await?;
    Ok(ApiResponse::new(portfolio))
}

/// Check the trading PIN
#[utoipa::path(
    post,
    path = "/api/v1/user/verify-pin",
    request_body = VerifyPinRequest,
    responses(
        (status = 200, description = "PIN accepted", body = MessageData),
        (status = 401, description = "Invalid PIN or token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "user"
)]
pub async fn verify_pin(
    State(state): State<Arc<AppState>>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
    WithRejection(Json(request), _): WithRejection<Json<VerifyPinRequest>, ApiError>,
) -> Result<ApiResponse<MessageData>, ApiError> {
    state.identity.verify_pin(account_id, &request.pin).await?;
    Ok(ApiResponse::new(MessageData::new("PIN verified")))
}
