//! Bearer-token authentication

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Account resolved from the `Authorization: Bearer <token>` header
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAccount(pub Uuid);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("malformed authorization header".to_string()))?;

        let account_id = state.identity.verify_token(token)?;
        Ok(AuthenticatedAccount(account_id))
    }
}
