//! # Stock Administration Service
//!
//! Back-office stock operations: stocktakes, deliveries, restock reports,
//! and the manual disable switch. Order-driven stock movement (reserve on
//! creation, release on cancellation) lives in the composition service;
//! this module is for humans with clipboards.

use tracing::info;

use kopi_core::validation::validate_quantity;
use kopi_core::{Product, User, UserRole, ValidationError};
use kopi_db::Database;

use crate::error::{EngineError, EngineResult};

/// Stock administration operations.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
}

impl StockService {
    /// Creates a new StockService on top of a database handle.
    pub fn new(db: Database) -> Self {
        StockService { db }
    }

    /// Gets one product's stock information.
    pub async fn stock_info(&self, product_id: &str) -> EngineResult<Product> {
        self.require_product(product_id).await
    }

    /// Lists stock information for every product.
    pub async fn all_stock_info(&self) -> EngineResult<Vec<Product>> {
        Ok(self.db.products().list().await?)
    }

    /// Lists products at or below their restock threshold.
    ///
    /// Advisory: a product on this list can still be sold until the
    /// ledger runs it to zero.
    pub async fn low_stock_products(&self) -> EngineResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    /// Stocktake: sets the absolute count and advisory levels.
    pub async fn set_stock_levels(
        &self,
        actor_id: &str,
        product_id: &str,
        stock_quantity: i64,
        min_stock_level: i64,
        max_stock_level: i64,
    ) -> EngineResult<Product> {
        self.require_staff(actor_id).await?;

        if stock_quantity < 0 || min_stock_level < 0 {
            return Err(ValidationError::MustBePositive {
                field: "stock level".to_string(),
            }
            .into());
        }
        if max_stock_level < min_stock_level {
            return Err(ValidationError::OutOfRange {
                field: "max_stock_level".to_string(),
                min: min_stock_level,
                max: i64::MAX,
            }
            .into());
        }

        self.db
            .products()
            .set_stock_levels(product_id, stock_quantity, min_stock_level, max_stock_level)
            .await?;

        let product = self.require_product(product_id).await?;
        info!(
            product = %product.name,
            stock = product.stock_quantity,
            "Stock levels set"
        );
        Ok(product)
    }

    /// Delivery: adds units on top of the current count.
    ///
    /// The reason is recorded in the log stream for the audit trail.
    pub async fn add_stock(
        &self,
        actor_id: &str,
        product_id: &str,
        quantity: i64,
        reason: Option<&str>,
    ) -> EngineResult<Product> {
        self.require_staff(actor_id).await?;
        validate_quantity(quantity)?;

        self.db.products().add_stock(product_id, quantity).await?;

        let product = self.require_product(product_id).await?;
        info!(
            product = %product.name,
            quantity,
            reason = reason.unwrap_or("restock"),
            new_stock = product.stock_quantity,
            "Stock added"
        );
        Ok(product)
    }

    /// Flips catalog management's manual disable switch.
    ///
    /// Orthogonal to stock: disabling keeps the count, restocking never
    /// re-enables.
    pub async fn set_product_disabled(
        &self,
        actor_id: &str,
        product_id: &str,
        disabled: bool,
    ) -> EngineResult<Product> {
        self.require_staff(actor_id).await?;

        self.db
            .products()
            .set_manually_disabled(product_id, disabled)
            .await?;

        let product = self.require_product(product_id).await?;
        info!(product = %product.name, disabled, "Manual disable flag set");
        Ok(product)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Stock administration is staff-only: cashiers and admins.
    async fn require_staff(&self, actor_id: &str) -> EngineResult<User> {
        let actor = self
            .db
            .users()
            .get_by_id(actor_id)
            .await?
            .ok_or_else(|| EngineError::not_found("User", actor_id))?;

        match actor.role {
            UserRole::Cashier | UserRole::Admin => Ok(actor),
            UserRole::Customer => Err(ValidationError::WrongRole {
                username: actor.username,
                reason: "stock management requires a staff role".to_string(),
            }
            .into()),
        }
    }

    async fn require_product(&self, product_id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))
    }
}
