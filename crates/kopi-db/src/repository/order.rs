//! # Order Repository
//!
//! Persistence for the order aggregate: order row, line items, and the
//! frozen customization copies under each line.
//!
//! ## Aggregate Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders                    1 ──► n  order_lines                         │
//! │  order_lines               1 ──► n  order_line_customizations           │
//! │                                                                         │
//! │  insert_order() writes all three levels on the caller's transaction;   │
//! │  get_by_id() reassembles them into one Order value.                    │
//! │                                                                         │
//! │  Status changes go through update_status(): a conditional UPDATE       │
//! │  guarded by the expected current status. Zero rows affected means      │
//! │  someone else moved the order first - the caller surfaces that as      │
//! │  a conflict instead of overwriting it.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kopi_core::{CustomizationSnapshot, Order, OrderLine, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLUMNS: &str = "id, customer_id, cashier_id, payment_method_id, status, \
     total_cents, notes, amount_tendered_cents, change_cents, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, unit_price_cents, subtotal_cents";

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a complete order aggregate on the caller's transaction.
    ///
    /// Order row, every line, and every line's customization snapshots go
    /// in together; the caller commits after stock reservation has also
    /// succeeded, or drops the transaction and none of this is visible.
    pub async fn insert_order(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
    ) -> DbResult<()> {
        debug!(id = %order.id, status = %order.status, lines = order.lines.len(), "Inserting order");

        sqlx::query(
            "INSERT INTO orders ( \
                 id, customer_id, cashier_id, payment_method_id, status, \
                 total_cents, notes, amount_tendered_cents, change_cents, \
                 created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&order.id)
        .bind(&order.customer_id)
        .bind(&order.cashier_id)
        .bind(&order.payment_method_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(order.amount_tendered_cents)
        .bind(order.change_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for line in &order.lines {
            sqlx::query(
                "INSERT INTO order_lines ( \
                     id, order_id, product_id, product_name, \
                     quantity, unit_price_cents, subtotal_cents \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&line.id)
            .bind(&line.order_id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .execute(&mut *conn)
            .await?;

            for snapshot in &line.customizations {
                sqlx::query(
                    "INSERT INTO order_line_customizations ( \
                         id, line_id, customization_id, \
                         name_snapshot, price_adjustment_cents_snapshot \
                     ) VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&line.id)
                .bind(&snapshot.customization_id)
                .bind(&snapshot.name)
                .bind(snapshot.price_adjustment_cents)
                .execute(&mut *conn)
                .await?;
            }
        }

        Ok(())
    }

    /// Gets a fully assembled order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => Ok(Some(self.attach_lines(order).await?)),
            None => Ok(None),
        }
    }

    /// Conditionally moves an order's status.
    ///
    /// The WHERE clause pins the status the caller validated against;
    /// a concurrent writer makes this affect zero rows.
    ///
    /// ## Returns
    /// * `Ok(true)` - status moved
    /// * `Ok(false)` - order missing or status changed underneath the caller
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<bool> {
        debug!(order_id = %order_id, from = %from, to = %to, "Updating order status");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE orders SET status = ?3, updated_at = ?4 \
             WHERE id = ?1 AND status = ?2",
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lists a customer's orders, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE customer_id = ?1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines_all(orders).await
    }

    /// Lists orders in a given status, newest first.
    pub async fn list_by_status(
        &self,
        status: OrderStatus,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines_all(orders).await
    }

    /// Lists orders created in a date range, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines_all(orders).await
    }

    /// Lists the most recent orders across all statuses.
    pub async fn list_recent(&self, limit: u32, offset: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines_all(orders).await
    }

    // =========================================================================
    // Aggregate assembly
    // =========================================================================

    /// Loads lines and their snapshots for one order row.
    async fn attach_lines(&self, mut order: Order) -> DbResult<Order> {
        let mut lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY id"
        ))
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        for line in &mut lines {
            line.customizations = sqlx::query_as::<_, CustomizationSnapshot>(
                "SELECT customization_id, \
                        name_snapshot AS name, \
                        price_adjustment_cents_snapshot AS price_adjustment_cents \
                 FROM order_line_customizations WHERE line_id = ?1 ORDER BY id",
            )
            .bind(&line.id)
            .fetch_all(&self.pool)
            .await?;
        }

        order.lines = lines;
        Ok(order)
    }

    /// Loads lines for a batch of order rows.
    async fn attach_lines_all(&self, orders: Vec<Order>) -> DbResult<Vec<Order>> {
        let mut assembled = Vec::with_capacity(orders.len());
        for order in orders {
            assembled.push(self.attach_lines(order).await?);
        }
        Ok(assembled)
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order line ID.
pub fn generate_line_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kopi_core::{PaymentMethodRecord, Product, User, UserRole};

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        db.users()
            .insert(&User {
                id: "u-1".to_string(),
                username: "budi".to_string(),
                role: UserRole::Customer,
                created_at: now,
            })
            .await
            .unwrap();

        db.products()
            .insert(&Product {
                id: "p-1".to_string(),
                name: "Cappuccino".to_string(),
                description: None,
                price_cents: 15000,
                stock_quantity: 10,
                min_stock_level: 2,
                max_stock_level: 100,
                manually_disabled: false,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        db.catalog()
            .insert_payment_method(&PaymentMethodRecord {
                id: "pm-1".to_string(),
                name: "QRIS".to_string(),
                description: None,
                is_cash: false,
            })
            .await
            .unwrap();

        db
    }

    fn sample_order(id: &str) -> Order {
        let now = Utc::now();
        let line_id = generate_line_id();
        Order {
            id: id.to_string(),
            customer_id: Some("u-1".to_string()),
            cashier_id: None,
            payment_method_id: "pm-1".to_string(),
            status: OrderStatus::WaitingPayment,
            total_cents: 40000,
            notes: Some("less ice".to_string()),
            amount_tendered_cents: None,
            change_cents: None,
            created_at: now,
            updated_at: now,
            lines: vec![OrderLine {
                id: line_id.clone(),
                order_id: id.to_string(),
                product_id: "p-1".to_string(),
                product_name: "Cappuccino".to_string(),
                quantity: 2,
                unit_price_cents: 15000,
                subtotal_cents: 40000,
                customizations: vec![CustomizationSnapshot {
                    customization_id: "c-1".to_string(),
                    name: "Extra Shot".to_string(),
                    price_adjustment_cents: 5000,
                }],
            }],
        }
    }

    async fn insert_sample(db: &Database, id: &str) {
        // Snapshot rows reference the catalog; seed the live entry first.
        db.catalog()
            .insert_customization(&kopi_core::Customization {
                id: "c-1".to_string(),
                name: "Extra Shot".to_string(),
                kind: Some("extra".to_string()),
                price_adjustment_cents: 5000,
                description: None,
            })
            .await
            .ok();

        let mut tx = db.begin().await.unwrap();
        db.orders().insert_order(&mut tx, &sample_order(id)).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_reload_aggregate() {
        let db = seeded_db().await;
        insert_sample(&db, "o-1").await;

        let order = db.orders().get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::WaitingPayment);
        assert_eq!(order.total_cents, 40000);
        assert_eq!(order.lines.len(), 1);

        let line = &order.lines[0];
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price_cents, 15000);
        assert_eq!(line.customizations.len(), 1);
        assert_eq!(line.customizations[0].name, "Extra Shot");
        assert_eq!(line.customizations[0].price_adjustment_cents, 5000);
    }

    #[tokio::test]
    async fn test_update_status_guard() {
        let db = seeded_db().await;
        insert_sample(&db, "o-1").await;

        // Guard matches: the update applies
        let mut tx = db.begin().await.unwrap();
        let moved = db
            .orders()
            .update_status(&mut tx, "o-1", OrderStatus::WaitingPayment, OrderStatus::Processing)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert!(moved);

        // Stale guard: someone already moved it, zero rows affected
        let mut tx = db.begin().await.unwrap();
        let moved = db
            .orders()
            .update_status(&mut tx, "o-1", OrderStatus::WaitingPayment, OrderStatus::Cancelled)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert!(!moved);

        let order = db.orders().get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_list_queries() {
        let db = seeded_db().await;
        insert_sample(&db, "o-1").await;
        insert_sample(&db, "o-2").await;

        let by_customer = db.orders().list_by_customer("u-1").await.unwrap();
        assert_eq!(by_customer.len(), 2);
        assert_eq!(by_customer[0].lines.len(), 1);

        let waiting = db
            .orders()
            .list_by_status(OrderStatus::WaitingPayment, 10, 0)
            .await
            .unwrap();
        assert_eq!(waiting.len(), 2);

        let none = db
            .orders()
            .list_by_status(OrderStatus::Completed, 10, 0)
            .await
            .unwrap();
        assert!(none.is_empty());

        let recent = db.orders().list_recent(1, 0).await.unwrap();
        assert_eq!(recent.len(), 1);
    }
}
