//! HTTP surface of the brokerage: routing, authentication, error mapping and
//! OpenAPI documentation.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;

use std::sync::Arc;

use account_service::AccountService;
use axum::routing::{get, post};
use axum::{Json, Router};
use identity_service::IdentityService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use trade_engine::TradeExecutor;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, stocks, transactions, user};

/// App state shared across handlers
pub struct AppState {
    /// Accounts, portfolio and history
    pub account_service: Arc<AccountService>,
    /// Quote lookup and trade execution
    pub executor: Arc<TradeExecutor>,
    /// Signup, login and sessions
    pub identity: Arc<IdentityService>,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup,
        auth::verify_otp,
        auth::login,
        stocks::get_price,
        transactions::submit_trade,
        transactions::get_history,
        user::get_portfolio,
        user::verify_pin,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::VerifyOtpRequest,
            auth::LoginRequest,
            auth::AccountCreated,
            user::VerifyPinRequest,
            trade_engine::TradeRequest,
            identity_service::Session,
            common::model::Quote,
            common::model::transaction::Transaction,
            common::model::transaction::TradeAction,
            common::model::account::Portfolio,
            common::model::account::Position,
            api::response::MessageData,
            api::response::ResponseMetadata,
            error::ErrorResponse,
            error::ErrorInfo
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Signup and login"),
        (name = "stocks", description = "Market quotes"),
        (name = "transactions", description = "Trading and history"),
        (name = "user", description = "Portfolio and PIN")
    ),
    info(
        title = "StockSaga API",
        version = "1.0.0",
        description = "Simulated brokerage: open an account, trade at live prices, track the portfolio"
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble the full application router
pub fn build_router(state: Arc<AppState>, log_level: Level) -> Router {
    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route("/auth/login", post(auth::login))
        .route("/stocks/price", get(stocks::get_price))
        .route("/transactions", post(transactions::submit_trade))
        .route("/transactions/history", get(transactions::get_history))
        .route("/user/portfolio", get(user::get_portfolio))
        .route("/user/verify-pin", post(user::verify_pin));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health))
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state)
}
