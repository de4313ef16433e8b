//! Shared fixtures for engine integration tests: an in-memory outlet with
//! a small seeded catalog, two staff accounts and one registered customer.

#![allow(dead_code)]

use chrono::Utc;
use kopi_core::{
    Customization, OrderLineRequest, PaymentMethodRecord, Product, User, UserRole,
};
use kopi_db::{Database, DbConfig};
use kopi_engine::{OrderService, StockService};

pub const CUSTOMER: &str = "u-customer";
pub const OTHER_CUSTOMER: &str = "u-other-customer";
pub const CASHIER: &str = "u-cashier";
pub const ADMIN: &str = "u-admin";

pub const CAPPUCCINO: &str = "p-cappuccino";
pub const CROISSANT: &str = "p-croissant";

pub const EXTRA_SHOT: &str = "c-extra-shot";
pub const OAT_MILK: &str = "c-oat-milk";

pub const CASH: &str = "Cash";
pub const QRIS: &str = "QRIS";
pub const PM_CASH: &str = "pm-cash";
pub const PM_QRIS: &str = "pm-qris";

pub struct Outlet {
    pub db: Database,
    pub orders: OrderService,
    pub stock: StockService,
}

/// Builds an isolated in-memory outlet:
/// - Cappuccino 15000, stock 10
/// - Croissant 18000, stock 5
/// - Extra Shot +5000, Oat Milk +7000
/// - Payment methods: Cash (cash), QRIS (non-cash)
pub async fn outlet() -> Outlet {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let now = Utc::now();

    for (id, username, role) in [
        (CUSTOMER, "budi", UserRole::Customer),
        (OTHER_CUSTOMER, "wati", UserRole::Customer),
        (CASHIER, "sari", UserRole::Cashier),
        (ADMIN, "agus", UserRole::Admin),
    ] {
        db.users()
            .insert(&User {
                id: id.to_string(),
                username: username.to_string(),
                role,
                created_at: now,
            })
            .await
            .unwrap();
    }

    for (id, name, price_cents, stock) in [
        (CAPPUCCINO, "Cappuccino", 15000, 10),
        (CROISSANT, "Croissant", 18000, 5),
    ] {
        db.products()
            .insert(&Product {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                stock_quantity: stock,
                min_stock_level: 2,
                max_stock_level: 100,
                manually_disabled: false,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    for (id, name, kind, adjustment) in [
        (EXTRA_SHOT, "Extra Shot", "extra", 5000),
        (OAT_MILK, "Oat Milk", "milk", 7000),
    ] {
        db.catalog()
            .insert_customization(&Customization {
                id: id.to_string(),
                name: name.to_string(),
                kind: Some(kind.to_string()),
                price_adjustment_cents: adjustment,
                description: None,
            })
            .await
            .unwrap();
    }

    for (id, name, is_cash) in [(PM_CASH, CASH, true), (PM_QRIS, QRIS, false)] {
        db.catalog()
            .insert_payment_method(&PaymentMethodRecord {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                is_cash,
            })
            .await
            .unwrap();
    }

    Outlet {
        orders: OrderService::new(db.clone()),
        stock: StockService::new(db.clone()),
        db,
    }
}

/// One requested line.
pub fn line(product_id: &str, quantity: i64, customization_ids: &[&str]) -> OrderLineRequest {
    OrderLineRequest {
        product_id: product_id.to_string(),
        quantity,
        customization_ids: customization_ids.iter().map(|s| s.to_string()).collect(),
    }
}

/// Current stock count, straight from the ledger.
pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}
