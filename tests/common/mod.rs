//! Test utilities and fixtures for Taquilla integration tests

#![allow(dead_code)]

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

// Re-export the main library crate
pub use taquilla::db::{init_db, queries, AppState};
pub use taquilla::gateway::{
    GatewayAmount, GatewayPayment, GatewayRefund, GatewaySale, MercadoPagoClient,
};
pub use taquilla::models::*;
pub use taquilla::reconcile;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create app state over a single-connection in-memory pool, for handler
/// tests. The gateway client points at an unroutable address: the paths
/// under test must return before any gateway call.
pub fn setup_test_state() -> AppState {
    let pool = r2d2::Pool::builder()
        .max_size(1)
        .build(SqliteConnectionManager::memory())
        .expect("Failed to create test pool");
    {
        let conn = pool.get().expect("Failed to get pooled connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    AppState {
        db: pool,
        gateway: MercadoPagoClient::new("http://127.0.0.1:9", "test-token"),
        base_url: "http://localhost:3000".to_string(),
        shop_url: "http://shop.local".to_string(),
    }
}

/// Create a test event with default values
pub fn create_test_event(conn: &Connection, slug: &str, capacity: Option<i64>) -> Event {
    let input = CreateEvent {
        slug: slug.to_string(),
        name: format!("Test Event {}", slug),
        currency: "ARS".to_string(),
        capacity,
    };
    queries::create_event(conn, &input).expect("Failed to create test event")
}

/// Create a test order in `pending` state
pub fn create_test_order(conn: &Connection, event_id: &str, total_cents: i64) -> Order {
    queries::create_order(conn, event_id, total_cents).expect("Failed to create test order")
}

/// Create a test payment in `created` state
pub fn create_test_payment(conn: &Connection, order_id: &str, amount_cents: i64) -> Payment {
    queries::create_payment(conn, order_id, amount_cents).expect("Failed to create test payment")
}

/// Confirm a payment and return it freshly loaded
pub fn confirm_test_payment(conn: &mut Connection, payment_id: &str) -> Payment {
    let outcome = queries::confirm_payment(conn, payment_id).expect("Failed to confirm payment");
    assert_eq!(outcome, ConfirmOutcome::Confirmed, "fixture confirmation should succeed");
    reload_payment(conn, payment_id)
}

pub fn reload_payment(conn: &Connection, payment_id: &str) -> Payment {
    queries::get_payment_by_id(conn, payment_id)
        .expect("Query failed")
        .expect("Payment not found")
}

pub fn reload_order(conn: &Connection, order_id: &str) -> Order {
    queries::get_order_by_id(conn, order_id)
        .expect("Query failed")
        .expect("Order not found")
}

// ============ Gateway record fixtures ============

pub fn amount(value: &str) -> GatewayAmount {
    GatewayAmount {
        value: value.to_string(),
        currency: None,
    }
}

pub fn gateway_payment(reference: &str, status: &str, detail: &str) -> GatewayPayment {
    GatewayPayment {
        external_reference: reference.to_string(),
        status: status.to_string(),
        status_detail: detail.to_string(),
    }
}

pub fn gateway_sale(id: &str, state: &str) -> GatewaySale {
    GatewaySale {
        id: id.to_string(),
        state: state.to_string(),
        total_refunded_amount: None,
    }
}

pub fn gateway_refund(id: &str, state: &str, value: &str) -> GatewayRefund {
    GatewayRefund {
        id: id.to_string(),
        state: state.to_string(),
        amount: amount(value),
        total_refunded_amount: None,
    }
}

pub fn gateway_refund_with_total(
    id: &str,
    state: &str,
    value: &str,
    total: &str,
) -> GatewayRefund {
    GatewayRefund {
        id: id.to_string(),
        state: state.to_string(),
        amount: amount(value),
        total_refunded_amount: Some(amount(total)),
    }
}
