//! # Product Repository
//!
//! Catalog reads and the stock ledger for products.
//!
//! ## Reservation Under Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why reserve() is a conditional UPDATE                      │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (oversells)                                 │
//! │     Worker A: SELECT stock → 1        Worker B: SELECT stock → 1       │
//! │     Worker A: UPDATE stock = 0        Worker B: UPDATE stock = 0       │
//! │     Both orders succeed, one cup of stock sold twice                   │
//! │                                                                         │
//! │  ✅ CORRECT: check-and-decrement in one statement                      │
//! │     UPDATE products                                                     │
//! │     SET    stock_quantity = stock_quantity - :qty                      │
//! │     WHERE  id = :id AND stock_quantity >= :qty                         │
//! │                                                                         │
//! │     SQLite executes the row update atomically; the second worker's     │
//! │     WHERE clause no longer matches and affects zero rows.              │
//! │     Exactly one of two concurrent last-unit orders succeeds.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Availability is derived (`stock_quantity > 0` AND not manually
//! disabled), so neither `reserve` nor `release` stores an availability
//! bit - and `release` can never override a manual disable.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kopi_core::Product;

/// Outcome of a stock reservation attempt.
///
/// `Insufficient` is data, not a `DbError`: the ledger reports the shortfall
/// and the engine decides how to surface it (with product name attached).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReservation {
    /// Stock was decremented; `remaining` is the new on-hand count.
    Reserved { remaining: i64 },
    /// Not enough stock; nothing was changed.
    Insufficient { available: i64 },
}

/// Repository for product reads and stock mutations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, \
     stock_quantity, min_stock_level, max_stock_level, manually_disabled, \
     created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products at or below their restock threshold.
    ///
    /// Advisory for restock reports; low stock never blocks a sale.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock_quantity <= min_stock_level ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products ( \
                 id, name, description, price_cents, \
                 stock_quantity, min_stock_level, max_stock_level, \
                 manually_disabled, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.max_stock_level)
        .bind(product.manually_disabled)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Stock Ledger
    // =========================================================================

    /// Atomically reserves `quantity` units of a product.
    ///
    /// Single conditional UPDATE: the stock check and the decrement are
    /// one statement, so no other reservation can interleave between them.
    /// Runs on the caller's transaction so order composition can roll the
    /// whole reservation set back.
    ///
    /// ## Returns
    /// * `Reserved { remaining }` - stock decremented
    /// * `Insufficient { available }` - stock untouched, not enough on hand
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such product
    pub async fn reserve(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<StockReservation> {
        debug!(product_id = %product_id, quantity = %quantity, "Reserving stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products \
             SET stock_quantity = stock_quantity - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock_quantity >= ?2",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            // Either the product is missing or the guard failed; one more
            // read tells us which, and gives the caller the shortfall.
            let available: Option<i64> =
                sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                    .bind(product_id)
                    .fetch_optional(&mut *conn)
                    .await?;

            return match available {
                None => Err(DbError::not_found("Product", product_id)),
                Some(available) => Ok(StockReservation::Insufficient { available }),
            };
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(StockReservation::Reserved { remaining })
    }

    /// Releases previously reserved units back to stock.
    ///
    /// Used by cancellations. Availability recovers automatically because
    /// it is derived from the count; `manually_disabled` stays as catalog
    /// management left it.
    pub async fn release(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, quantity = %quantity, "Releasing stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products \
             SET stock_quantity = stock_quantity + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Adds stock from a delivery (delta update, restock path).
    pub async fn add_stock(&self, product_id: &str, quantity: i64) -> DbResult<()> {
        debug!(product_id = %product_id, quantity = %quantity, "Adding stock");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products \
             SET stock_quantity = stock_quantity + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Sets the absolute stock count and advisory levels (stocktake path).
    pub async fn set_stock_levels(
        &self,
        product_id: &str,
        stock_quantity: i64,
        min_stock_level: i64,
        max_stock_level: i64,
    ) -> DbResult<()> {
        debug!(
            product_id = %product_id,
            stock_quantity = %stock_quantity,
            "Setting stock levels"
        );

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products \
             SET stock_quantity = ?2, min_stock_level = ?3, \
                 max_stock_level = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(product_id)
        .bind(stock_quantity)
        .bind(min_stock_level)
        .bind(max_stock_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Sets catalog management's manual disable flag.
    ///
    /// This is the only write path for `manually_disabled`; the stock
    /// ledger never touches it.
    pub async fn set_manually_disabled(
        &self,
        product_id: &str,
        disabled: bool,
    ) -> DbResult<()> {
        debug!(product_id = %product_id, disabled = %disabled, "Setting manual disable flag");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET manually_disabled = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(product_id)
        .bind(disabled)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn test_product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: None,
            price_cents: 15000,
            stock_quantity: stock,
            min_stock_level: 2,
            max_stock_level: 100,
            manually_disabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    async fn db_with_product(stock: i64) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&test_product("p-1", stock)).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let db = db_with_product(10).await;

        let mut tx = db.begin().await.unwrap();
        let outcome = db.products().reserve(&mut tx, "p-1", 3).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome, StockReservation::Reserved { remaining: 7 });
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 7);
    }

    #[tokio::test]
    async fn test_reserve_to_zero_makes_unavailable() {
        let db = db_with_product(2).await;

        let mut tx = db.begin().await.unwrap();
        let outcome = db.products().reserve(&mut tx, "p-1", 2).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome, StockReservation::Reserved { remaining: 0 });
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert!(!product.is_in_stock());
        assert!(!product.is_available());
    }

    #[tokio::test]
    async fn test_reserve_insufficient_changes_nothing() {
        let db = db_with_product(2).await;

        let mut tx = db.begin().await.unwrap();
        let outcome = db.products().reserve(&mut tx, "p-1", 5).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(outcome, StockReservation::Insufficient { available: 2 });
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let db = db_with_product(2).await;

        let mut tx = db.begin().await.unwrap();
        let err = db.products().reserve(&mut tx, "ghost", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rolled_back_reservation_is_invisible() {
        let db = db_with_product(10).await;

        let mut tx = db.begin().await.unwrap();
        db.products().reserve(&mut tx, "p-1", 4).await.unwrap();
        drop(tx); // rollback

        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_release_restores_availability_but_not_manual_disable() {
        let db = db_with_product(1).await;

        // Sell out, then disable the product manually
        let mut tx = db.begin().await.unwrap();
        db.products().reserve(&mut tx, "p-1", 1).await.unwrap();
        tx.commit().await.unwrap();
        db.products().set_manually_disabled("p-1", true).await.unwrap();

        // Releasing stock brings the count back, not the product
        let mut tx = db.begin().await.unwrap();
        db.products().release(&mut tx, "p-1", 1).await.unwrap();
        tx.commit().await.unwrap();

        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert!(product.is_in_stock());
        assert!(product.manually_disabled);
        assert!(!product.is_available());

        // Re-enabling makes it orderable again
        db.products().set_manually_disabled("p-1", false).await.unwrap();
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert!(product.is_available());
    }

    #[tokio::test]
    async fn test_stock_admin_paths() {
        let db = db_with_product(0).await;

        db.products().add_stock("p-1", 12).await.unwrap();
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 12);

        db.products().set_stock_levels("p-1", 4, 5, 50).await.unwrap();
        let product = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(product.stock_quantity, 4);
        assert_eq!(product.min_stock_level, 5);
        assert!(product.is_low_stock());

        let low = db.products().list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "p-1");
    }
}
