//! # Catalog Repository
//!
//! Lookups for customizations and payment methods. The engine resolves
//! every referenced id/name through here before an order is composed;
//! full catalog CRUD lives with catalog management, outside the engine.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kopi_core::{Customization, PaymentMethodRecord};

/// Repository for customization and payment-method lookups.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Customizations
    // =========================================================================

    /// Gets a customization by its ID.
    pub async fn get_customization(&self, id: &str) -> DbResult<Option<Customization>> {
        let customization = sqlx::query_as::<_, Customization>(
            "SELECT id, name, kind, price_adjustment_cents, description \
             FROM customizations WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customization)
    }

    /// Lists all customizations, sorted by name.
    pub async fn list_customizations(&self) -> DbResult<Vec<Customization>> {
        let customizations = sqlx::query_as::<_, Customization>(
            "SELECT id, name, kind, price_adjustment_cents, description \
             FROM customizations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customizations)
    }

    /// Inserts a customization.
    pub async fn insert_customization(&self, customization: &Customization) -> DbResult<()> {
        debug!(id = %customization.id, name = %customization.name, "Inserting customization");

        sqlx::query(
            "INSERT INTO customizations (id, name, kind, price_adjustment_cents, description) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&customization.id)
        .bind(&customization.name)
        .bind(&customization.kind)
        .bind(customization.price_adjustment_cents)
        .bind(&customization.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a customization's name and price adjustment.
    ///
    /// Exists so tests can prove snapshot independence: editing the live
    /// row must never change historical order lines.
    pub async fn update_customization(&self, customization: &Customization) -> DbResult<()> {
        debug!(id = %customization.id, "Updating customization");

        sqlx::query(
            "UPDATE customizations \
             SET name = ?2, kind = ?3, price_adjustment_cents = ?4, description = ?5 \
             WHERE id = ?1",
        )
        .bind(&customization.id)
        .bind(&customization.name)
        .bind(&customization.kind)
        .bind(customization.price_adjustment_cents)
        .bind(&customization.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Payment methods
    // =========================================================================

    /// Gets a payment method by its ID (self-service channel).
    pub async fn get_payment_method(&self, id: &str) -> DbResult<Option<PaymentMethodRecord>> {
        let method = sqlx::query_as::<_, PaymentMethodRecord>(
            "SELECT id, name, description, is_cash FROM payment_methods WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    /// Gets a payment method by its unique name (cashier channel).
    pub async fn get_payment_method_by_name(
        &self,
        name: &str,
    ) -> DbResult<Option<PaymentMethodRecord>> {
        let method = sqlx::query_as::<_, PaymentMethodRecord>(
            "SELECT id, name, description, is_cash FROM payment_methods WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    /// Inserts a payment method.
    pub async fn insert_payment_method(&self, method: &PaymentMethodRecord) -> DbResult<()> {
        debug!(id = %method.id, name = %method.name, "Inserting payment method");

        sqlx::query(
            "INSERT INTO payment_methods (id, name, description, is_cash) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(&method.description)
        .bind(method.is_cash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
