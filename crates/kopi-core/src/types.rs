//! # Domain Types
//!
//! Core domain types used throughout Kopi POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  status         │   │  quantity       │       │
//! │  │  stock_quantity │   │  total_cents    │   │  unit_price ✱   │       │
//! │  │  min/max level  │   │  customer XOR   │   │  subtotal_cents │       │
//! │  └─────────────────┘   │  cashier        │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌──────────────────────┐                        │
//! │  │ Customization   │   │ CustomizationSnapshot│ ✱ = frozen at          │
//! │  │  (live catalog) │──►│  (frozen copy)       │     order time         │
//! │  └─────────────────┘   └──────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot-at-write
//! `CustomizationSnapshot` is a separate type from `Customization` on
//! purpose: an order line must never hold a live reference into the
//! catalog. The copy happens exactly once, when the line is built, so
//! later catalog edits cannot rewrite the history of what was charged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Users & Roles
// =============================================================================

/// Role held by a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Registered customer placing self-service orders.
    Customer,
    /// Staff member taking walk-in orders at the counter.
    Cashier,
    /// Back-office account managing stock levels.
    Admin,
}

/// A user account, customer or staff.
///
/// Credential verification and sessions live outside the engine; the
/// engine only needs identity and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to customers and on receipts.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Unit price in minor currency units.
    pub price_cents: i64,

    /// Units currently on hand. Never negative.
    pub stock_quantity: i64,

    /// Advisory restock threshold.
    pub min_stock_level: i64,

    /// Advisory shelf capacity.
    pub max_stock_level: i64,

    /// Catalog management's explicit disable switch.
    ///
    /// Orthogonal to stock: restocking a manually disabled product must
    /// NOT put it back on sale. Only this flag records that intent.
    pub manually_disabled: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Derived signal: at least one unit on hand.
    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Whether this product can be ordered right now.
    ///
    /// Both signals must agree: stock on hand AND not manually disabled.
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.manually_disabled && self.is_in_stock()
    }

    /// Advisory signal for restock reports; never blocks a sale.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

// =============================================================================
// Customization (live catalog)
// =============================================================================

/// A priced modifier attachable to an order line (size, extra shot,
/// oat milk, ...). Catalog-owned and mutable over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customization {
    pub id: String,
    pub name: String,
    /// Free-form type tag ("size", "milk", "extra", ...).
    pub kind: Option<String>,
    /// Price delta in minor units. May be zero or negative.
    pub price_adjustment_cents: i64,
    pub description: Option<String>,
}

impl Customization {
    /// Returns the price adjustment as Money.
    #[inline]
    pub fn price_adjustment(&self) -> Money {
        Money::from_cents(self.price_adjustment_cents)
    }

    /// Freezes this catalog entry into an immutable snapshot.
    ///
    /// This is the only way a customization enters an order line.
    pub fn snapshot(&self) -> CustomizationSnapshot {
        CustomizationSnapshot {
            customization_id: self.id.clone(),
            name: self.name.clone(),
            price_adjustment_cents: self.price_adjustment_cents,
        }
    }
}

// =============================================================================
// Customization Snapshot (frozen)
// =============================================================================

/// Immutable copy of a customization's name and price adjustment,
/// captured when an order line is created.
///
/// Once an order exists, later edits to the customization catalog must
/// never change historical order totals - hence a structurally distinct
/// type rather than a reference to the live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomizationSnapshot {
    /// The catalog entry this was copied from (for traceability only;
    /// never re-read for pricing).
    pub customization_id: String,
    /// Name at order time.
    pub name: String,
    /// Price adjustment at order time, minor units.
    pub price_adjustment_cents: i64,
}

impl CustomizationSnapshot {
    /// Returns the frozen price adjustment as Money.
    #[inline]
    pub fn price_adjustment(&self) -> Money {
        Money::from_cents(self.price_adjustment_cents)
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One product entry within an order.
///
/// Created and priced atomically with its order, immutable afterwards.
/// Unit price and customizations are snapshots taken at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at order time (frozen).
    pub product_name: String,
    /// Quantity ordered, always >= 1.
    pub quantity: i64,
    /// Unit price in minor units at order time (frozen).
    pub unit_price_cents: i64,
    /// (unit price + Σ adjustments) × quantity, minor units.
    pub subtotal_cents: i64,
    /// Frozen customization copies. Loaded separately from the line row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub customizations: Vec<CustomizationSnapshot>,
}

impl OrderLine {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order, from either channel.
///
/// ## Channel invariant
/// Exactly one of `customer_id` / `cashier_id` is set:
/// - self-service orders reference the registered customer who placed them
/// - walk-in orders reference the cashier who rang them up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Registered customer (self-service channel).
    pub customer_id: Option<String>,
    /// Processing cashier (walk-in channel).
    pub cashier_id: Option<String>,
    pub payment_method_id: String,
    pub status: OrderStatus,
    /// Sum of line subtotals, minor units.
    pub total_cents: i64,
    pub notes: Option<String>,
    /// Cash handed over at the counter (walk-in, cash methods).
    pub amount_tendered_cents: Option<i64>,
    /// amount_tendered − total. Never negative; never set for non-cash.
    pub change_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Line items, loaded separately from the order row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True for orders placed through the self-service channel.
    #[inline]
    pub fn is_customer_order(&self) -> bool {
        self.customer_id.is_some()
    }

    /// True for orders rung up at the counter.
    #[inline]
    pub fn is_cashier_order(&self) -> bool {
        self.cashier_id.is_some()
    }

    /// Returns the computed change as Money, if any.
    #[inline]
    pub fn change(&self) -> Option<Money> {
        self.change_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A payment method record from the catalog (Cash, QRIS, debit card, ...).
///
/// `is_cash` is an explicit column: cash is the one method where the
/// engine must collect a tendered amount and compute change. Detecting
/// cash by name matching is how systems break the first time someone
/// renames the method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentMethodRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_cash: bool,
}

// =============================================================================
// Order Line Request
// =============================================================================

/// One requested line in an incoming order, before resolution.
///
/// Customization ids are resolved against the catalog during
/// composition; an unknown id fails the whole order rather than being
/// silently dropped, because dropping a modifier would misstate the
/// charged price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub customization_ids: Vec<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, disabled: bool) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Cappuccino".to_string(),
            description: None,
            price_cents: 15000,
            stock_quantity: stock,
            min_stock_level: 5,
            max_stock_level: 100,
            manually_disabled: disabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_availability_is_two_signals() {
        assert!(product(10, false).is_available());
        // Out of stock: derived signal wins
        assert!(!product(0, false).is_available());
        // In stock but manually disabled: manual intent wins
        assert!(!product(10, true).is_available());
        assert!(product(10, true).is_in_stock());
    }

    #[test]
    fn test_low_stock_is_advisory() {
        let p = product(5, false);
        assert!(p.is_low_stock());
        // Low stock does not make a product unavailable
        assert!(p.is_available());
        assert!(!product(6, false).is_low_stock());
    }

    #[test]
    fn test_snapshot_is_independent_of_catalog() {
        let mut live = Customization {
            id: "c-1".to_string(),
            name: "Extra Shot".to_string(),
            kind: Some("extra".to_string()),
            price_adjustment_cents: 5000,
            description: None,
        };

        let frozen = live.snapshot();

        // Catalog edits after the snapshot must not leak into it
        live.name = "Double Extra Shot".to_string();
        live.price_adjustment_cents = 9000;

        assert_eq!(frozen.name, "Extra Shot");
        assert_eq!(frozen.price_adjustment_cents, 5000);
        assert_eq!(frozen.customization_id, "c-1");
    }

    #[test]
    fn test_order_channel_helpers() {
        let order = Order {
            id: "o-1".to_string(),
            customer_id: Some("u-1".to_string()),
            cashier_id: None,
            payment_method_id: "pm-1".to_string(),
            status: OrderStatus::WaitingPayment,
            total_cents: 40000,
            notes: None,
            amount_tendered_cents: None,
            change_cents: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            lines: Vec::new(),
        };

        assert!(order.is_customer_order());
        assert!(!order.is_cashier_order());
        assert_eq!(order.total().cents(), 40000);
        assert!(order.change().is_none());
    }
}
