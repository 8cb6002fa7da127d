//! Error handling for the API gateway

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Common(#[from] Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                Error::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "insufficient_funds"),
                Error::InsufficientShares(_) => (StatusCode::BAD_REQUEST, "insufficient_shares"),
                Error::NoSuchPosition(_) => (StatusCode::BAD_REQUEST, "no_such_position"),
                Error::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
                Error::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
                Error::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),

                // Upstream
                Error::QuoteUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "quote_unavailable"),

                // Server errors (5xx)
                Error::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error"),
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::debug!("API Error [{}]: {}", request_id, &self);
        }

        // Storage details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_status() {
        let cases = [
            (Error::ValidationError(String::new()), StatusCode::BAD_REQUEST),
            (Error::InsufficientFunds(String::new()), StatusCode::BAD_REQUEST),
            (Error::NoSuchPosition(String::new()), StatusCode::BAD_REQUEST),
            (Error::AccountNotFound(String::new()), StatusCode::NOT_FOUND),
            (Error::QuoteUnavailable(String::new()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::AuthenticationError(String::new()), StatusCode::UNAUTHORIZED),
            (Error::AlreadyExists(String::new()), StatusCode::CONFLICT),
            (Error::Persistence(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }
}
