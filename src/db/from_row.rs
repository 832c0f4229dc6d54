//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const EVENT_COLS: &str = "id, slug, name, currency, capacity, created_at";

pub const ORDER_COLS: &str =
    "id, event_id, code, secret, status, total_cents, created_at, updated_at";

pub const PAYMENT_COLS: &str =
    "id, order_id, provider, state, amount_cents, info, created_at, updated_at";

pub const REFUND_COLS: &str =
    "id, payment_id, state, amount_cents, gateway_id, info, created_at, updated_at";

pub const GATEWAY_REF_COLS: &str =
    "id, reference, order_id, payment_id, refund_id, created_at";

pub const ORDER_LOG_COLS: &str = "id, order_id, action, data, created_at";

// ============ FromRow Implementations ============

impl FromRow for Event {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Event {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            currency: row.get(3)?,
            capacity: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            event_id: row.get(1)?,
            code: row.get(2)?,
            secret: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            total_cents: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            order_id: row.get(1)?,
            provider: row.get(2)?,
            state: parse_enum(row, 3, "state")?,
            amount_cents: row.get(4)?,
            info: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Refund {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Refund {
            id: row.get(0)?,
            payment_id: row.get(1)?,
            state: parse_enum(row, 2, "state")?,
            amount_cents: row.get(3)?,
            gateway_id: row.get(4)?,
            info: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for GatewayRef {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(GatewayRef {
            id: row.get(0)?,
            reference: row.get(1)?,
            order_id: row.get(2)?,
            payment_id: row.get(3)?,
            refund_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for OrderLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderLogEntry {
            id: row.get(0)?,
            order_id: row.get(1)?,
            action: row.get(2)?,
            data: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}
