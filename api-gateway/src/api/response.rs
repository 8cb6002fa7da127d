//! Standardized API response formats
//!
//! Every successful response wraps its payload in `{ "data": ... }`, with
//! optional metadata next to it.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// A standardized API response wrapper for single resource responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// The response data
    pub data: T,
    /// Optional metadata about the response (e.g. request ID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMetadata>,
}

/// Additional metadata about the response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMetadata {
    /// Number of items in a list response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// A standardized API response wrapper for list/collection responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiListResponse<T> {
    /// The list of items
    pub data: Vec<T>,
    /// Optional metadata about the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMetadata>,
}

// Implementation to convert ApiResponse to axum Response
impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// Implementation to convert ApiListResponse to axum Response
impl<T> IntoResponse for ApiListResponse<T>
where
    T: Serialize + Debug,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T> ApiResponse<T> {
    /// Create a new API response with just data
    pub fn new(data: T) -> Self {
        Self { data, meta: None }
    }
}

impl<T> ApiListResponse<T> {
    /// Create a new list response; the item count goes into the metadata
    pub fn new(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            data,
            meta: Some(ResponseMetadata { count: Some(count) }),
        }
    }
}

/// Plain acknowledgement payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
