//! # Order Composition Service
//!
//! The two order channels, one consistent model.
//!
//! ## Composition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 compose_*_order()                                       │
//! │                                                                         │
//! │  1. Validate request shape (line count, notes, quantities)             │
//! │  2. Resolve actor ── wrong role? ──────────────► Validation            │
//! │  3. Resolve payment method ── missing? ────────► NotFound              │
//! │  4. Per line: resolve product + customizations,                        │
//! │     freeze snapshots, price                                            │
//! │     (unknown customization id? ────────────────► NotFound,             │
//! │      NEVER silently dropped - it would misstate the charge)            │
//! │  5. Cashier channel only: settle tender / change                       │
//! │  6. BEGIN TRANSACTION                                                  │
//! │       reserve stock per line  ── short? ───────► InsufficientStock,    │
//! │       insert order aggregate                     tx dropped, all       │
//! │     COMMIT                                       reservations undone   │
//! │                                                                         │
//! │  No partial order, no partial reservation, ever.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation is the reverse edge: the status flip and the stock release
//! commit in the same transaction, so once `cancel` returns the inventory
//! is already back.

use chrono::Utc;
use tracing::{debug, info, warn};

use kopi_core::{
    pricing, validate_transition, Money, Order, OrderLine, OrderLineRequest, OrderStatus,
    User, UserRole, ValidationError,
};
use kopi_core::validation::{validate_notes, validate_order_size};
use kopi_db::repository::order::{generate_line_id, generate_order_id};
use kopi_db::{Database, DbError, StockReservation};

use crate::error::{EngineError, EngineResult};

/// Orchestrates order creation and lifecycle for both channels.
///
/// Cloneable handle; all state lives in the database.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Creates a new OrderService on top of a database handle.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    // =========================================================================
    // Channel entry points
    // =========================================================================

    /// Composes a self-service order for a registered customer.
    ///
    /// The order starts in `WaitingPayment`; payment is confirmed later
    /// through [`confirm_payment`](Self::confirm_payment). Inventory is
    /// reserved as part of composition.
    pub async fn compose_customer_order(
        &self,
        customer_id: &str,
        lines: &[OrderLineRequest],
        payment_method_id: &str,
        notes: Option<String>,
    ) -> EngineResult<Order> {
        info!(customer_id = %customer_id, lines = lines.len(), "Composing customer order");

        validate_order_size(lines.len())?;
        validate_notes(notes.as_deref())?;

        let customer = self.require_user(customer_id).await?;
        if customer.role != UserRole::Customer {
            return Err(ValidationError::WrongRole {
                username: customer.username,
                reason: "only registered customers can place self-service orders".to_string(),
            }
            .into());
        }

        let method = self
            .db
            .catalog()
            .get_payment_method(payment_method_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Payment method", payment_method_id))?;

        let order_id = generate_order_id();
        let priced = self.price_lines(&order_id, lines).await?;
        let total: Money = priced.iter().map(|l| l.subtotal()).sum();

        let now = Utc::now();
        let order = Order {
            id: order_id,
            customer_id: Some(customer.id),
            cashier_id: None,
            payment_method_id: method.id,
            status: OrderStatus::WaitingPayment,
            total_cents: total.cents(),
            notes,
            amount_tendered_cents: None,
            change_cents: None,
            created_at: now,
            updated_at: now,
            lines: priced,
        };

        self.persist_with_reservations(order).await
    }

    /// Composes a walk-in order rung up by a cashier.
    ///
    /// Payment settles at creation: the order starts in `Paid`. For cash
    /// methods a tendered amount is mandatory and must cover the total;
    /// change is computed, never clamped. For non-cash methods a tendered
    /// amount may be recorded but change stays unset.
    pub async fn compose_cashier_order(
        &self,
        cashier_id: &str,
        lines: &[OrderLineRequest],
        payment_method_name: &str,
        tendered_cents: Option<i64>,
        notes: Option<String>,
    ) -> EngineResult<Order> {
        info!(cashier_id = %cashier_id, lines = lines.len(), "Composing cashier order");

        validate_order_size(lines.len())?;
        validate_notes(notes.as_deref())?;

        let cashier = self.require_user(cashier_id).await?;
        if cashier.role != UserRole::Cashier {
            return Err(ValidationError::WrongRole {
                username: cashier.username,
                reason: "only cashiers can process walk-in orders".to_string(),
            }
            .into());
        }

        let method = self
            .db
            .catalog()
            .get_payment_method_by_name(payment_method_name)
            .await?
            .ok_or_else(|| EngineError::not_found("Payment method", payment_method_name))?;

        let order_id = generate_order_id();
        let priced = self.price_lines(&order_id, lines).await?;
        let total: Money = priced.iter().map(|l| l.subtotal()).sum();

        // Settle the tender before anything is reserved: a rejected
        // payment must leave no trace.
        let (amount_tendered_cents, change_cents) = if method.is_cash {
            let tendered = tendered_cents.ok_or_else(|| ValidationError::Required {
                field: "amount_tendered".to_string(),
            })?;
            let change = pricing::change_due(Money::from_cents(tendered), total)
                .map_err(|e| {
                    warn!(total = %total, tendered = %tendered, "Tender rejected");
                    e
                })?;
            (Some(tendered), Some(change.cents()))
        } else {
            (tendered_cents, None)
        };

        let now = Utc::now();
        let order = Order {
            id: order_id,
            customer_id: None,
            cashier_id: Some(cashier.id),
            payment_method_id: method.id,
            status: OrderStatus::Paid,
            total_cents: total.cents(),
            notes,
            amount_tendered_cents,
            change_cents,
            created_at: now,
            updated_at: now,
            lines: priced,
        };

        self.persist_with_reservations(order).await
    }

    // =========================================================================
    // Lifecycle operations
    // =========================================================================

    /// Confirms payment on a self-service order.
    ///
    /// Named convenience transition, equivalent to
    /// `WaitingPayment → Processing`; fails for any other current status -
    /// including a second confirmation of the same order.
    pub async fn confirm_payment(&self, order_id: &str) -> EngineResult<Order> {
        info!(order_id = %order_id, "Confirming payment");

        let order = self.require_order(order_id).await?;
        if order.status != OrderStatus::WaitingPayment {
            return Err(EngineError::InvalidStatusTransition {
                from: order.status,
                to: OrderStatus::Processing,
            });
        }

        self.apply_transition(order, OrderStatus::Processing).await
    }

    /// Cancels an order on behalf of a requesting actor.
    ///
    /// Allowed only from `WaitingPayment` or `Processing`. The requester
    /// must be the ordering customer, or hold the cashier role. Releases
    /// exactly the inventory the order reserved, in the same transaction
    /// as the status flip.
    pub async fn cancel_order(
        &self,
        order_id: &str,
        requesting_actor_id: &str,
    ) -> EngineResult<Order> {
        info!(order_id = %order_id, actor = %requesting_actor_id, "Cancelling order");

        let order = self.require_order(order_id).await?;
        let actor = self.require_user(requesting_actor_id).await?;

        let is_owner = order.customer_id.as_deref() == Some(actor.id.as_str());
        if !is_owner && actor.role != UserRole::Cashier {
            return Err(ValidationError::WrongRole {
                username: actor.username,
                reason: "only the ordering customer or a cashier can cancel this order"
                    .to_string(),
            }
            .into());
        }

        self.cancel_with_release(order).await
    }

    /// Applies a generic status transition.
    ///
    /// Validated against the transition table; a transition to
    /// `Cancelled` goes through the same release path as
    /// [`cancel_order`](Self::cancel_order).
    pub async fn transition_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> EngineResult<Order> {
        info!(order_id = %order_id, new_status = %new_status, "Transitioning order status");

        let order = self.require_order(order_id).await?;
        validate_transition(order.status, new_status)?;

        if new_status == OrderStatus::Cancelled {
            self.cancel_with_release(order).await
        } else {
            self.apply_transition(order, new_status).await
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a fully assembled order by ID.
    pub async fn get_order(&self, order_id: &str) -> EngineResult<Order> {
        self.require_order(order_id).await
    }

    /// Lists a customer's orders, newest first.
    pub async fn orders_for_customer(&self, customer_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_by_customer(customer_id).await?)
    }

    /// Lists orders in a given status, newest first.
    pub async fn orders_with_status(
        &self,
        status: OrderStatus,
        limit: u32,
        offset: u32,
    ) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_by_status(status, limit, offset).await?)
    }

    /// Lists orders created in a date range, newest first.
    pub async fn orders_between(
        &self,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_between(start, end).await?)
    }

    /// Lists the most recent orders across all statuses.
    pub async fn recent_orders(&self, limit: u32, offset: u32) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().list_recent(limit, offset).await?)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Resolves, snapshots and prices every requested line.
    ///
    /// Every referenced record must resolve; the first failure aborts the
    /// whole composition before any state is touched.
    async fn price_lines(
        &self,
        order_id: &str,
        requests: &[OrderLineRequest],
    ) -> EngineResult<Vec<OrderLine>> {
        let mut lines = Vec::with_capacity(requests.len());

        for request in requests {
            let product = self
                .db
                .products()
                .get_by_id(&request.product_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Product", &request.product_id))?;

            // Manual disable is a hard stop regardless of stock; an empty
            // shelf is reported by the reservation step with the exact
            // shortfall instead.
            if product.manually_disabled {
                return Err(ValidationError::ProductUnavailable {
                    name: product.name,
                }
                .into());
            }

            let mut snapshots = Vec::with_capacity(request.customization_ids.len());
            for customization_id in &request.customization_ids {
                let customization = self
                    .db
                    .catalog()
                    .get_customization(customization_id)
                    .await?
                    .ok_or_else(|| {
                        EngineError::not_found("Customization", customization_id)
                    })?;
                snapshots.push(customization.snapshot());
            }

            let subtotal = pricing::line_subtotal(product.price(), request.quantity, &snapshots)?;

            debug!(
                product = %product.name,
                quantity = request.quantity,
                subtotal = %subtotal,
                "Priced order line"
            );

            lines.push(OrderLine {
                id: generate_line_id(),
                order_id: order_id.to_string(),
                product_id: product.id,
                product_name: product.name,
                quantity: request.quantity,
                unit_price_cents: product.price_cents,
                subtotal_cents: subtotal.cents(),
                customizations: snapshots,
            });
        }

        Ok(lines)
    }

    /// Reserves stock for every line and persists the aggregate, all in
    /// one transaction.
    ///
    /// A failed reservation drops the transaction, which rolls back every
    /// reservation made for earlier lines - partial reservation across
    /// lines is not acceptable.
    async fn persist_with_reservations(&self, order: Order) -> EngineResult<Order> {
        let mut tx = self.db.begin().await?;

        for line in &order.lines {
            match self
                .db
                .products()
                .reserve(&mut tx, &line.product_id, line.quantity)
                .await?
            {
                StockReservation::Reserved { remaining } => {
                    debug!(product = %line.product_name, remaining, "Stock reserved");
                }
                StockReservation::Insufficient { available } => {
                    warn!(
                        product = %line.product_name,
                        available,
                        requested = line.quantity,
                        "Reservation failed"
                    );
                    return Err(EngineError::InsufficientStock {
                        product: line.product_name.clone(),
                        available,
                        requested: line.quantity,
                    });
                }
            }
        }

        self.db.orders().insert_order(&mut tx, &order).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            order_id = %order.id,
            status = %order.status,
            total = %order.total(),
            "Order created"
        );

        Ok(order)
    }

    /// Flips the status with a guard on the value just validated against.
    async fn apply_transition(&self, order: Order, to: OrderStatus) -> EngineResult<Order> {
        let mut tx = self.db.begin().await?;
        let moved = self
            .db
            .orders()
            .update_status(&mut tx, &order.id, order.status, to)
            .await?;

        if !moved {
            return Err(EngineError::conflict(format!(
                "order {} was modified concurrently",
                order.id
            )));
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(order_id = %order.id, from = %order.status, to = %to, "Order status changed");

        self.require_order(&order.id).await
    }

    /// Cancels and releases reserved inventory atomically.
    async fn cancel_with_release(&self, order: Order) -> EngineResult<Order> {
        validate_transition(order.status, OrderStatus::Cancelled)?;

        let mut tx = self.db.begin().await?;
        let moved = self
            .db
            .orders()
            .update_status(&mut tx, &order.id, order.status, OrderStatus::Cancelled)
            .await?;

        if !moved {
            return Err(EngineError::conflict(format!(
                "order {} was modified concurrently",
                order.id
            )));
        }

        for line in &order.lines {
            self.db
                .products()
                .release(&mut tx, &line.product_id, line.quantity)
                .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(order_id = %order.id, lines = order.lines.len(), "Order cancelled, stock released");

        self.require_order(&order.id).await
    }

    async fn require_order(&self, order_id: &str) -> EngineResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Order", order_id))
    }

    async fn require_user(&self, user_id: &str) -> EngineResult<User> {
        self.db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("User", user_id))
    }
}
