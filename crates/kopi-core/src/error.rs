//! # Error Types
//!
//! Domain-specific error types for kopi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kopi-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kopi-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  kopi-engine errors (separate crate)                                   │
//! │  └── EngineError      - What callers of the engine see                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, statuses, amounts)
//! 3. Errors are enum variants, never String
//! 4. Nothing is coerced or clamped - an insufficient tender is an error,
//!    not a zero change

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-facing messages by callers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds what is on hand.
    ///
    /// Carries both numbers so the caller can show "only 3 left".
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The requested status change is not in the transition table.
    ///
    /// ## When This Occurs
    /// - Confirming payment on an order that is not waiting for payment
    /// - Cancelling an order that is already on the counter
    /// - Any transition out of a terminal status
    #[error("Order status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An order must carry at least one line.
    #[error("Order must contain at least one line item")]
    EmptyOrder,

    /// Product is on the menu but cannot be ordered right now
    /// (manually disabled by catalog management).
    #[error("Product {name} is currently unavailable")]
    ProductUnavailable { name: String },

    /// Cash tendered does not cover the order total.
    ///
    /// Change must never go negative; this is rejected here, not clamped.
    #[error("Amount tendered {tendered_cents} is less than order total {total_cents}")]
    TenderedTooSmall {
        tendered_cents: i64,
        total_cents: i64,
    },

    /// The acting user does not hold the role this channel requires.
    #[error("{username} cannot perform this operation: {reason}")]
    WrongRole { username: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
