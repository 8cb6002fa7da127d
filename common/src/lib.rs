//! Common types and utilities for the brokerage backend
//!
//! This library contains the shared money types, the error taxonomy, the
//! domain models and the database bootstrap helpers used by every crate in
//! the workspace.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, ErrorExt, Result};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
