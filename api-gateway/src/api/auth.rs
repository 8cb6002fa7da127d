//! Signup, OTP confirmation and login

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use common::decimal::Amount;
use identity_service::Session;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::{ApiResponse, MessageData};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// Signup request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    /// At least 8 characters
    pub password: String,
    /// Trading PIN, 4 to 6 digits
    pub pin: String,
}

/// OTP confirmation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Newly opened account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountCreated {
    pub account_id: Uuid,
    pub balance: Amount,
}

/// Start a signup; the OTP is sent out of band
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "OTP sent", body = MessageData),
        (status = 400, description = "Invalid e-mail, password or PIN", body = ErrorResponse),
        (status = 409, description = "Account already exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<SignupRequest>, ApiError>,
) -> Result<(StatusCode, ApiResponse<MessageData>), ApiError> {
    state
        .identity
        .signup(&request.email, &request.password, &request.pin)
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::new(MessageData::new("Signup successful, OTP sent"))))
}

/// Confirm a signup and open the account
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account opened", body = AccountCreated),
        (status = 400, description = "No signup request, expired or invalid OTP", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<VerifyOtpRequest>, ApiError>,
) -> Result<(StatusCode, ApiResponse<AccountCreated>), ApiError> {
    let account = state.identity.verify_otp(&request.email, &request.otp).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(AccountCreated {
            account_id: account.id,
            balance: account.balance,
        }),
    ))
}

/// Exchange e-mail and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = Session),
        (status = 401, description = "Invalid e-mail or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<ApiResponse<Session>, ApiError> {
    let session = state.identity.login(&request.email, &request.password).await?;
    Ok(ApiResponse::new(session))
}
