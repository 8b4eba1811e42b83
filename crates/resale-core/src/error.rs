//! # Error Types
//!
//! Domain-specific error types for resale-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  resale-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  resale-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                        (wraps CoreError transparently)                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → API layer               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, id, amount)
//! 3. Errors are enum variants, never String
//! 4. Every mutating operation aborts its transaction on the first error

use thiserror::Error;

use crate::types::InventoryStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger business rule violations.
///
/// These errors represent broken cross-entity invariants or bad monetary
/// input. They abort the enclosing transaction unmodified.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A monetary input is not a finite, representable number.
    #[error("{field} is not a valid numeric value")]
    InvalidNumeric { field: String },

    /// A monetary value exceeds what its fixed-precision column can store.
    #[error("{field} exceeds the supported monetary precision")]
    PrecisionOverflow { field: String },

    /// `remaining = total - paid_now` went below zero.
    #[error("remaining amount must not be negative (got {remaining_cents} cents)")]
    NegativeRemaining { remaining_cents: i64 },

    /// The same inventory item was referenced twice in one request.
    #[error("duplicate item reference in request: {reference}")]
    DuplicateItemRef { reference: String },

    /// The item is not in a sellable state.
    ///
    /// ## When This Occurs
    /// - Attaching an item whose status is not IN_STOCK or READY_FOR_SALE
    /// - The storage-level "already actively sold" case surfaces as a
    ///   `Conflict` from the database layer instead
    #[error("inventory item {item_id} is {status:?} and cannot be sold")]
    NotSellable {
        item_id: i64,
        status: InventoryStatus,
    },

    /// A seller worker id was supplied but resolves to no active worker.
    #[error("seller worker {worker_id} is not an active worker")]
    InvalidWorkerRef { worker_id: i64 },

    /// A salary month string is not in `YYYY-MM` form.
    #[error("month must be in YYYY-MM format (got '{value}')")]
    InvalidMonth { value: String },

    /// PAID_NOW sales must be fully paid up front.
    #[error("PAID_NOW requires paid_now ({paid_now_cents}) to equal total_price ({total_cents})")]
    PaidNowBelowTotal {
        paid_now_cents: i64,
        total_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Used for early validation before ledger logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// One amount must not exceed another.
    #[error("{field} must not exceed {limit_field}")]
    MustNotExceed { field: String, limit_field: String },

    /// Two fields must be supplied together or not at all.
    #[error("{first} and {second} must be provided together")]
    ProvideTogether { first: String, second: String },

    /// Invalid format (e.g., malformed IMEI).
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
        let err = CoreError::NotSellable {
            item_id: 7,
            status: InventoryStatus::Sold,
        };
        assert_eq!(err.to_string(), "inventory item 7 is Sold and cannot be sold");

        let err = CoreError::InvalidMonth {
            value: "2026-13".to_string(),
        };
        assert_eq!(err.to_string(), "month must be in YYYY-MM format (got '2026-13')");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::ProvideTogether {
            first: "customer.full_name".to_string(),
            second: "customer.phone_number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "customer.full_name and customer.phone_number must be provided together"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "imei".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
