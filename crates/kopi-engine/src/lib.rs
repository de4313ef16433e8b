//! # kopi-engine: Order Composition Service for Kopi POS
//!
//! The orchestration layer where the two order channels meet the pricing
//! calculator, the stock ledger, and the status state machine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Kopi POS Control Flow                               │
//! │                                                                         │
//! │  creation request (API layer, out of scope)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  kopi-engine (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   OrderService                     StockService                 │   │
//! │  │   ├── compose_customer_order       ├── stock_info               │   │
//! │  │   ├── compose_cashier_order        ├── low_stock_products       │   │
//! │  │   ├── confirm_payment              ├── set_stock_levels         │   │
//! │  │   ├── cancel_order                 ├── add_stock                │   │
//! │  │   └── transition_status            └── set_product_disabled     │   │
//! │  │                                                                 │   │
//! │  └───────────┬─────────────────────────────────────┬───────────────┘   │
//! │              │ pure rules                          │ storage           │
//! │              ▼                                     ▼                   │
//! │        kopi-core                              kopi-db                  │
//! │   (pricing, lifecycle table)        (repositories, transactions)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **All-or-nothing composition**: resolving, pricing, reserving and
//!   persisting happen per request; the first failure aborts with nothing
//!   visible - no partial order, no partial reservation.
//! - **No oversell**: reservation is a conditional decrement executed
//!   atomically per product row.
//! - **One transition table**: every status change, from either channel,
//!   is validated by kopi-core's state machine.
//! - **No retries**: `Conflict` is surfaced to the caller, who may retry.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod orders;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{EngineError, EngineResult};
pub use orders::OrderService;
pub use stock::StockService;
