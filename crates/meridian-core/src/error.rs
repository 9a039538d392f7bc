//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  meridian-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  meridian-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST layer errors (in apps/server)                                    │
//! │  └── ApiError         - What the web client sees (status + JSON)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → HTTP         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, loyalty number, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations caught before any
/// write happens. They are caught by the API layer and translated to
/// 400-class responses.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout submitted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the total.
    ///
    /// ## When This Occurs
    /// Cash checkout where `amount_received < total`. Rejected before
    /// the transaction header is ever inserted.
    #[error("Insufficient cash: total {total_cents} cents, received {received_cents} cents")]
    InsufficientCash {
        total_cents: i64,
        received_cents: i64,
    },

    /// Discount input is malformed (negative, or a percentage over 100).
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// Points redemption is malformed.
    #[error("Invalid points redemption: {reason}")]
    InvalidRedemption { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed loyalty number or store code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientCash {
            total_cents: 2700,
            received_cents: 2000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient cash: total 2700 cents, received 2000 cents"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::InvalidFormat {
            field: "loyalty_number".to_string(),
            reason: "must be 3 uppercase letters followed by 3 digits".to_string(),
        };
        assert!(err.to_string().contains("loyalty_number"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
