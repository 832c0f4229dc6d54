use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

use super::from_row::{
    query_all, query_one, EVENT_COLS, GATEWAY_REF_COLS, ORDER_COLS, ORDER_LOG_COLS, PAYMENT_COLS,
    REFUND_COLS,
};

pub const PROVIDER: &str = "mercadopago";

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Short buyer-facing order code (uppercase, link-safe).
fn gen_order_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

// ============ Events ============

pub fn create_event(conn: &Connection, input: &CreateEvent) -> Result<Event> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO events (id, slug, name, currency, capacity, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &input.slug, &input.name, &input.currency, input.capacity, now],
    )?;

    Ok(Event {
        id,
        slug: input.slug.clone(),
        name: input.name.clone(),
        currency: input.currency.clone(),
        capacity: input.capacity,
        created_at: now,
    })
}

pub fn get_event_by_id(conn: &Connection, id: &str) -> Result<Option<Event>> {
    query_one(
        conn,
        &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLS),
        &[&id],
    )
}

pub fn get_event_by_slug(conn: &Connection, slug: &str) -> Result<Option<Event>> {
    query_one(
        conn,
        &format!("SELECT {} FROM events WHERE slug = ?1", EVENT_COLS),
        &[&slug],
    )
}

pub fn count_events(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(count)
}

// ============ Orders ============

pub fn create_order(conn: &Connection, event_id: &str, total_cents: i64) -> Result<Order> {
    let id = gen_id();
    let now = now();
    let code = gen_order_code();
    let secret = Uuid::new_v4().simple().to_string();

    conn.execute(
        "INSERT INTO orders (id, event_id, code, secret, status, total_cents, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?6)",
        params![&id, event_id, &code, &secret, total_cents, now],
    )?;

    Ok(Order {
        id,
        event_id: event_id.to_string(),
        code,
        secret,
        status: OrderStatus::Pending,
        total_cents,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn get_order_by_code(conn: &Connection, code: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE code = ?1", ORDER_COLS),
        &[&code],
    )
}

pub fn count_paid_orders(conn: &Connection, event_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE event_id = ?1 AND status = 'paid'",
        [event_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Payments ============

pub fn create_payment(conn: &Connection, order_id: &str, amount_cents: i64) -> Result<Payment> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO payments (id, order_id, provider, state, amount_cents, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'created', ?4, ?5, ?5)",
        params![&id, order_id, PROVIDER, amount_cents, now],
    )?;

    Ok(Payment {
        id,
        order_id: order_id.to_string(),
        provider: PROVIDER.to_string(),
        state: PaymentState::Created,
        amount_cents,
        info: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_payment_by_id(conn: &Connection, id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

/// Record the gateway's status detail on a payment without touching its state.
pub fn record_payment_info(conn: &Connection, payment_id: &str, info: &str) -> Result<()> {
    conn.execute(
        "UPDATE payments SET info = ?1, updated_at = ?2 WHERE id = ?3",
        params![info, now(), payment_id],
    )?;
    Ok(())
}

/// Apply a mapped (order status, payment state) pair plus the gateway status
/// detail in a single transaction, so order and payment can never disagree.
pub fn apply_payment_status(
    conn: &mut Connection,
    payment: &Payment,
    order_status: OrderStatus,
    payment_state: PaymentState,
    info: &str,
) -> Result<()> {
    let now = now();
    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![order_status.as_ref(), now, &payment.order_id],
    )?;
    tx.execute(
        "UPDATE payments SET state = ?1, info = ?2, updated_at = ?3 WHERE id = ?4",
        params![payment_state.as_ref(), info, now, &payment.id],
    )?;

    tx.commit()?;
    Ok(())
}

/// Confirm a payment: mark it confirmed and its order paid, after checking
/// the event's capacity. Quota exhaustion leaves everything untouched and
/// reports `QuotaExceeded` instead of erroring.
pub fn confirm_payment(conn: &mut Connection, payment_id: &str) -> Result<ConfirmOutcome> {
    let now = now();
    let tx = conn.transaction()?;

    let (order_id, event_id, order_status): (String, String, String) = tx.query_row(
        "SELECT o.id, o.event_id, o.status FROM payments p
         JOIN orders o ON o.id = p.order_id WHERE p.id = ?1",
        [payment_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let capacity: Option<i64> = tx.query_row(
        "SELECT capacity FROM events WHERE id = ?1",
        [&event_id],
        |row| row.get(0),
    )?;

    if let Some(cap) = capacity {
        // The order being confirmed may already be paid (idempotent redelivery);
        // it must not count against itself.
        let paid: i64 = tx.query_row(
            "SELECT COUNT(*) FROM orders WHERE event_id = ?1 AND status = 'paid' AND id != ?2",
            params![&event_id, &order_id],
            |row| row.get(0),
        )?;
        if paid >= cap && order_status != "paid" {
            return Ok(ConfirmOutcome::QuotaExceeded);
        }
    }

    tx.execute(
        "UPDATE orders SET status = 'paid', updated_at = ?1 WHERE id = ?2",
        params![now, &order_id],
    )?;
    tx.execute(
        "UPDATE payments SET state = 'confirmed', updated_at = ?1 WHERE id = ?2",
        params![now, payment_id],
    )?;

    tx.commit()?;
    Ok(ConfirmOutcome::Confirmed)
}

// ============ Refunds ============

/// Record a merchant-initiated refund in `created` state. It moves to `done`
/// once the gateway confirms it through a notification.
pub fn create_refund(
    conn: &Connection,
    payment_id: &str,
    amount_cents: i64,
    gateway_id: Option<&str>,
) -> Result<Refund> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO refunds (id, payment_id, state, amount_cents, gateway_id, created_at, updated_at)
         VALUES (?1, ?2, 'created', ?3, ?4, ?5, ?5)",
        params![&id, payment_id, amount_cents, gateway_id, now],
    )?;

    Ok(Refund {
        id,
        payment_id: payment_id.to_string(),
        state: RefundState::Created,
        amount_cents,
        gateway_id: gateway_id.map(|s| s.to_string()),
        info: None,
        created_at: now,
        updated_at: now,
    })
}

/// Record a refund first reported by the gateway. Also indexes the gateway
/// refund id in `gateway_refs` so later notifications resolve without
/// scanning, and flips the payment to `refunded` (order canceled) once the
/// known refunded sum covers the full payment amount.
pub fn create_external_refund(
    conn: &mut Connection,
    payment: &Payment,
    amount_cents: i64,
    gateway_id: Option<&str>,
    info: Option<&str>,
) -> Result<Refund> {
    let id = gen_id();
    let now = now();
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO refunds (id, payment_id, state, amount_cents, gateway_id, info, created_at, updated_at)
         VALUES (?1, ?2, 'external', ?3, ?4, ?5, ?6, ?6)",
        params![&id, &payment.id, amount_cents, gateway_id, info, now],
    )?;

    if let Some(reference) = gateway_id {
        tx.execute(
            "INSERT OR IGNORE INTO gateway_refs (id, reference, order_id, payment_id, refund_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![gen_id(), reference, &payment.order_id, &payment.id, &id, now],
        )?;
    }

    let known_sum: i64 = tx.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM refunds WHERE payment_id = ?1",
        [&payment.id],
        |row| row.get(0),
    )?;
    if known_sum >= payment.amount_cents {
        tx.execute(
            "UPDATE payments SET state = 'refunded', updated_at = ?1 WHERE id = ?2",
            params![now, &payment.id],
        )?;
        tx.execute(
            "UPDATE orders SET status = 'canceled', updated_at = ?1 WHERE id = ?2",
            params![now, &payment.order_id],
        )?;
    }

    tx.commit()?;

    Ok(Refund {
        id,
        payment_id: payment.id.clone(),
        state: RefundState::External,
        amount_cents,
        gateway_id: gateway_id.map(|s| s.to_string()),
        info: info.map(|s| s.to_string()),
        created_at: now,
        updated_at: now,
    })
}

pub fn mark_refund_done(conn: &Connection, refund_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE refunds SET state = 'done', updated_at = ?1 WHERE id = ?2",
        params![now(), refund_id],
    )?;
    Ok(affected > 0)
}

/// Sum of known refund amounts for a payment. Every refund state counts:
/// created and in-transit refunds already reserve their amount.
pub fn refund_known_sum(conn: &Connection, payment_id: &str) -> Result<i64> {
    let sum = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM refunds WHERE payment_id = ?1",
        [payment_id],
        |row| row.get(0),
    )?;
    Ok(sum)
}

pub fn get_refund_by_gateway_id(
    conn: &Connection,
    payment_id: &str,
    gateway_id: &str,
) -> Result<Option<Refund>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM refunds WHERE payment_id = ?1 AND gateway_id = ?2",
            REFUND_COLS
        ),
        &[&payment_id, &gateway_id],
    )
}

pub fn refunds_for_payment(conn: &Connection, payment_id: &str) -> Result<Vec<Refund>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM refunds WHERE payment_id = ?1 ORDER BY created_at",
            REFUND_COLS
        ),
        &[&payment_id],
    )
}

// ============ Gateway references ============

pub fn create_gateway_ref(
    conn: &Connection,
    reference: &str,
    order_id: &str,
    payment_id: Option<&str>,
) -> Result<GatewayRef> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT OR IGNORE INTO gateway_refs (id, reference, order_id, payment_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, reference, order_id, payment_id, now],
    )?;

    Ok(GatewayRef {
        id,
        reference: reference.to_string(),
        order_id: order_id.to_string(),
        payment_id: payment_id.map(|s| s.to_string()),
        refund_id: None,
        created_at: now,
    })
}

/// Resolve the first matching reference from a candidate set. The unique
/// index on `reference` guarantees at most one payment per gateway id.
pub fn find_gateway_ref(conn: &Connection, references: &[&str]) -> Result<Option<GatewayRef>> {
    if references.is_empty() {
        return Ok(None);
    }
    let placeholders = (1..=references.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {} FROM gateway_refs WHERE reference IN ({}) LIMIT 1",
        GATEWAY_REF_COLS, placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    let result = stmt
        .query_row(rusqlite::params_from_iter(references.iter()), |row| {
            use super::from_row::FromRow;
            GatewayRef::from_row(row)
        })
        .optional()?;
    Ok(result)
}

/// Secondary payment match within an event, via the reference index.
pub fn find_payment_by_reference(
    conn: &Connection,
    event_id: &str,
    reference: &str,
) -> Result<Option<Payment>> {
    let cols: String = PAYMENT_COLS
        .split(", ")
        .map(|c| format!("p.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    query_one(
        conn,
        &format!(
            "SELECT {} FROM gateway_refs r
             JOIN payments p ON p.id = r.payment_id
             JOIN orders o ON o.id = p.order_id
             WHERE r.reference = ?1 AND o.event_id = ?2",
            cols
        ),
        &[&reference, &event_id],
    )
}

// ============ Order log ============

pub fn log_order_event(
    conn: &Connection,
    order_id: &str,
    action: &str,
    data: &serde_json::Value,
) -> Result<()> {
    conn.execute(
        "INSERT INTO order_log (id, order_id, action, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![gen_id(), order_id, action, data.to_string(), now()],
    )?;
    Ok(())
}

pub fn order_log(conn: &Connection, order_id: &str) -> Result<Vec<OrderLogEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM order_log WHERE order_id = ?1 ORDER BY created_at",
            ORDER_LOG_COLS
        ),
        &[&order_id],
    )
}
