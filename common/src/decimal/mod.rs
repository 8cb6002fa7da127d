//! Decimal type utilities for precise financial calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision
pub type Price = Decimal;

/// Cash amount type (typically Price * Shares)
pub type Amount = Decimal;

/// Whole number of shares held or traded
pub type Shares = u32;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Default price precision (8 decimal places)
    pub const PRICE_PRECISION: u32 = 8;

    /// Round price to standard precision
    pub fn round_price(price: Price) -> Price {
        price.round_dp(PRICE_PRECISION).normalize()
    }
}

/// Convert a floating point price coming from an upstream feed.
///
/// Returns `None` for NaN, infinities and values that do not fit a decimal.
pub fn price_from_f64(value: f64) -> Option<Price> {
    if !value.is_finite() {
        return None;
    }
    Decimal::try_from(value).ok().map(precision::round_price)
}
