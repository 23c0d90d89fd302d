//! # Error Types
//!
//! Domain-specific error types for bazario-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazario-core errors (this file)                                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── DiscountError    - Cart/voucher applicability failures            │
//! │                                                                         │
//! │  bazario-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError/DiscountError → DbError → ApiError → Client     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, amounts, field names)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed voucher code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Discount Error
// =============================================================================

/// Cart-validation failures from the discount calculator.
///
/// These are business rejections, not faults: the voucher itself is live,
/// but the supplied cart does not qualify for it.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Cart total is below the voucher's minimum purchase amount.
    ///
    /// ## When This Occurs
    /// ```text
    /// Voucher { min_purchase: ₹500.00 }
    ///      │
    ///      ▼
    /// Cart total: ₹400.00
    ///      │
    ///      ▼
    /// BelowMinimum { minimum: 50000, cart_total: 40000 }
    /// ```
    #[error("cart total {cart_total} is below the minimum purchase amount {minimum}")]
    BelowMinimum { minimum: Money, cart_total: Money },

    /// The voucher is scoped to specific products and none are in the cart.
    #[error("voucher is not applicable to any item in the cart")]
    NotApplicable,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
