//! # Error Types
//!
//! Error taxonomy for the core crate. Validation failures and pricing
//! failures are separate enums so callers can map each to its own HTTP
//! class without string matching.

use thiserror::Error;

/// Input that failed validation before any business logic ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid coupon code: {reason}")]
    InvalidCouponCode { reason: String },

    #[error("invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    #[error("invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("{field} cannot be negative (got {cents})")]
    NegativeAmount { field: String, cents: i64 },

    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Failures from the core pricing and coupon logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Coupon(#[from] crate::coupon::CouponRejection),

    #[error("unknown country code: {code}")]
    UnknownCountry { code: String },
}
