//! # Order Status Lifecycle
//!
//! The single source of truth for order status transitions.
//!
//! ## The State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Lifecycle                                    │
//! │                                                                         │
//! │  Self-service channel          Cashier (walk-in) channel               │
//! │  ────────────────────          ─────────────────────────               │
//! │                                                                         │
//! │  WAITING_PAYMENT ──────┐           PAID                                │
//! │     │          │       │            │                                   │
//! │     │ confirm  │       │            │                                   │
//! │     ▼          │       │            ▼                                   │
//! │  PROCESSING ◄──┼───────┼────────────┘                                   │
//! │     │          │       │                                                │
//! │     │          ▼       ▼                                                │
//! │     │       CANCELLED (terminal)                                        │
//! │     ▼                                                                   │
//! │  READY_FOR_PICKUP                                                       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  COMPLETED (terminal)                                                   │
//! │                                                                         │
//! │  Every transition not drawn above is rejected with                     │
//! │  InvalidStatusTransition, and the order is left untouched.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A walk-in order starts in `Paid` because payment settles at the counter;
//! it joins the shared kitchen lifecycle through `Paid → Processing`. A paid
//! order cannot be cancelled directly - money already changed hands.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// Stored as snake_case text in the database and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed by a customer, payment not yet confirmed.
    WaitingPayment,
    /// Walk-in order, payment settled at creation.
    Paid,
    /// Payment confirmed, order is being prepared.
    Processing,
    /// Prepared and waiting for the customer.
    ReadyForPickup,
    /// Picked up. Terminal.
    Completed,
    /// Cancelled before preparation finished. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Returns the statuses reachable from `self` in one step.
    ///
    /// This table is the whole state machine; every other method here is
    /// derived from it.
    pub const fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::WaitingPayment => {
                &[OrderStatus::Processing, OrderStatus::Cancelled]
            }
            OrderStatus::Paid => &[OrderStatus::Processing],
            OrderStatus::Processing => {
                &[OrderStatus::ReadyForPickup, OrderStatus::Cancelled]
            }
            OrderStatus::ReadyForPickup => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    /// Checks whether a single-step transition to `to` is allowed.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// True for statuses with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// True if an order in this status may still be cancelled.
    ///
    /// Cancellation releases reserved inventory, so it is only allowed
    /// while the order has not been handed over.
    pub fn is_cancellable(&self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }

    /// All statuses, for exhaustive iteration in tests and reports.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::WaitingPayment,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::ReadyForPickup,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];
}

/// Display uses the wire form (snake_case) so log lines, error messages
/// and stored values all read the same.
impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::WaitingPayment => "waiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Transition Validation
// =============================================================================

/// Validates a single-step status transition.
///
/// ## Errors
/// `CoreError::InvalidStatusTransition` naming both the current and the
/// requested status. The caller's state must be left unchanged on error.
///
/// ## Example
/// ```rust
/// use kopi_core::status::{validate_transition, OrderStatus};
///
/// assert!(validate_transition(OrderStatus::WaitingPayment, OrderStatus::Processing).is_ok());
/// assert!(validate_transition(OrderStatus::Completed, OrderStatus::Processing).is_err());
/// ```
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidStatusTransition { from, to })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
