//! End-to-end tests for the walk-in channel: immediate settlement, change
//! computation, and the concurrency guarantee on the last unit of stock.

mod support;

use kopi_core::{OrderStatus, ValidationError};
use kopi_engine::EngineError;
use support::*;

#[tokio::test]
async fn cash_sale_with_change() {
    let outlet = outlet().await;

    // (15000 + 5000) × 2 = 40000, tendered 50000 → change 10000
    let order = outlet
        .orders
        .compose_cashier_order(
            CASHIER,
            &[line(CAPPUCCINO, 2, &[EXTRA_SHOT])],
            CASH,
            Some(50000),
            None,
        )
        .await
        .unwrap();

    assert_eq!(order.total_cents, 40000);
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.is_cashier_order());
    assert!(!order.is_customer_order());
    assert_eq!(order.amount_tendered_cents, Some(50000));
    assert_eq!(order.change_cents, Some(10000));

    assert_eq!(stock_of(&outlet.db, CAPPUCCINO).await, 8);
}

#[tokio::test]
async fn exact_tender_gives_zero_change() {
    let outlet = outlet().await;

    let order = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CROISSANT, 1, &[])], CASH, Some(18000), None)
        .await
        .unwrap();

    assert_eq!(order.change_cents, Some(0));
}

#[tokio::test]
async fn short_tender_is_rejected_not_clamped() {
    let outlet = outlet().await;

    // Tendering 30000 against a 40000 total
    let err = outlet
        .orders
        .compose_cashier_order(
            CASHIER,
            &[line(CAPPUCCINO, 2, &[EXTRA_SHOT])],
            CASH,
            Some(30000),
            None,
        )
        .await
        .unwrap_err();

    match err {
        EngineError::Validation(ValidationError::TenderedTooSmall {
            tendered_cents,
            total_cents,
        }) => {
            assert_eq!(tendered_cents, 30000);
            assert_eq!(total_cents, 40000);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Order not created, stock not reserved
    assert!(outlet.orders.recent_orders(10, 0).await.unwrap().is_empty());
    assert_eq!(stock_of(&outlet.db, CAPPUCCINO).await, 10);
}

#[tokio::test]
async fn cash_without_tendered_amount_is_rejected() {
    let outlet = outlet().await;

    let err = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CAPPUCCINO, 1, &[])], CASH, None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Required { .. })
    ));
    assert_eq!(stock_of(&outlet.db, CAPPUCCINO).await, 10);
}

#[tokio::test]
async fn non_cash_tender_is_optional_and_change_stays_unset() {
    let outlet = outlet().await;

    // No tendered amount at all
    let order = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CAPPUCCINO, 1, &[])], QRIS, None, None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert!(order.amount_tendered_cents.is_none());
    assert!(order.change_cents.is_none());

    // A recorded tendered amount is kept, but change is never computed
    let order = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CAPPUCCINO, 1, &[])], QRIS, Some(20000), None)
        .await
        .unwrap();
    assert_eq!(order.amount_tendered_cents, Some(20000));
    assert!(order.change_cents.is_none());
}

#[tokio::test]
async fn only_cashiers_can_ring_up_walk_ins() {
    let outlet = outlet().await;

    for actor in [CUSTOMER, ADMIN] {
        let err = outlet
            .orders
            .compose_cashier_order(actor, &[line(CAPPUCCINO, 1, &[])], CASH, Some(20000), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::WrongRole { .. })
        ));
    }
}

#[tokio::test]
async fn unknown_payment_method_name() {
    let outlet = outlet().await;

    let err = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CAPPUCCINO, 1, &[])], "Barter", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn paid_order_joins_the_shared_lifecycle() {
    let outlet = outlet().await;

    let order = outlet
        .orders
        .compose_cashier_order(CASHIER, &[line(CAPPUCCINO, 2, &[])], CASH, Some(30000), None)
        .await
        .unwrap();

    // Payment already settled: direct cancellation is not in the table
    let err = outlet.orders.cancel_order(&order.id, CASHIER).await.unwrap_err();
    match err {
        EngineError::InvalidStatusTransition { from, to } => {
            assert_eq!(from, OrderStatus::Paid);
            assert_eq!(to, OrderStatus::Cancelled);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Paid → Processing, then the usual path applies
    let processing = outlet
        .orders
        .transition_status(&order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(processing.status, OrderStatus::Processing);

    let cancelled = outlet.orders.cancel_order(&order.id, CASHIER).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&outlet.db, CAPPUCCINO).await, 10);
}

#[tokio::test]
async fn concurrent_orders_for_the_last_unit() {
    let outlet = outlet().await;

    // Run the croissant shelf down to a single unit
    outlet
        .db
        .products()
        .set_stock_levels(CROISSANT, 1, 2, 100)
        .await
        .unwrap();

    let lines_a = [line(CROISSANT, 1, &[])];
    let lines_b = [line(CROISSANT, 1, &[])];
    let (a, b) = tokio::join!(
        outlet.orders.compose_cashier_order(
            CASHIER,
            &lines_a,
            CASH,
            Some(20000),
            None,
        ),
        outlet.orders.compose_cashier_order(
            CASHIER,
            &lines_b,
            CASH,
            Some(20000),
            None,
        ),
    );

    // Exactly one order was created in Paid, the other saw the shortfall
    let (ok, err) = match (a, b) {
        (Ok(order), Err(err)) => (order, err),
        (Err(err), Ok(order)) => (order, err),
        (Ok(_), Ok(_)) => panic!("both orders succeeded: last unit sold twice"),
        (Err(a), Err(b)) => panic!("both orders failed: {a} / {b}"),
    };

    assert_eq!(ok.status, OrderStatus::Paid);
    match err {
        EngineError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 0);
            assert_eq!(requested, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Final stock is zero and the product derived itself unavailable
    let croissant = outlet
        .db
        .products()
        .get_by_id(CROISSANT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(croissant.stock_quantity, 0);
    assert!(!croissant.is_available());
}
