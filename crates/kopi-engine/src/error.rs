//! # Engine Error Type
//!
//! The unified error surface for callers of the engine.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    What callers can get back                            │
//! │                                                                         │
//! │  NotFound                 referenced product / customization /          │
//! │                           payment method / order / actor absent         │
//! │  Validation               quantity < 1, wrong role, short tender, ...  │
//! │  InsufficientStock        requested exceeds available (both numbers)    │
//! │  InvalidStatusTransition  current and requested status named            │
//! │  Conflict                 concurrent modification at the storage        │
//! │                           boundary; caller may retry, engine never does │
//! │  Db                       everything else from the storage layer        │
//! │                                                                         │
//! │  Nothing is silently coerced: a short tender is an error, not          │
//! │  change clamped to zero; an unknown customization id fails the         │
//! │  whole order, it is never dropped.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kopi_core::{CoreError, OrderStatus, ValidationError};
use kopi_db::DbError;

/// Errors surfaced by the order composition and stock services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The request breaks a business rule before any state is touched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Requested quantity exceeds available stock; carries both numbers.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The requested status change is not in the transition table.
    #[error("Order status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Concurrent modification detected at the storage boundary.
    ///
    /// The engine performs no automatic retry; callers may retry
    /// (bounded, idempotent) if they wish.
    #[error("Concurrent modification: {message}")]
    Conflict { message: String },

    /// Storage failure that is none of the above.
    #[error("Database error: {0}")]
    Db(DbError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict {
            message: message.into(),
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => EngineError::InsufficientStock {
                product,
                available,
                requested,
            },
            CoreError::InvalidStatusTransition { from, to } => {
                EngineError::InvalidStatusTransition { from, to }
            }
            CoreError::Validation(v) => EngineError::Validation(v),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::Conflict { message } => EngineError::Conflict { message },
            other => EngineError::Db(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: EngineError = CoreError::InsufficientStock {
            product: "Latte".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert!(matches!(err, EngineError::InsufficientStock { available: 1, .. }));

        let err: EngineError = CoreError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Processing,
        }
        .into();
        assert!(matches!(err, EngineError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_db_error_mapping() {
        let err: EngineError = DbError::not_found("Order", "o-1").into();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err: EngineError = DbError::conflict("status moved").into();
        assert!(matches!(err, EngineError::Conflict { .. }));

        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Db(_)));
    }
}
