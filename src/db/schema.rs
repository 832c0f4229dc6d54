use rusqlite::Connection;

/// Initialize the ledger schema.
/// WAL mode with synchronous=NORMAL: concurrent webhook deliveries queue on
/// the write lock instead of failing with SQLITE_BUSY.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA journal_size_limit = 67108864;

        -- Events (tickets are sold per event; capacity bounds paid orders)
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            currency TEXT NOT NULL,
            capacity INTEGER,
            created_at INTEGER NOT NULL
        );

        -- Orders (buyer-facing, identified by code + secret in links)
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            code TEXT NOT NULL UNIQUE,
            secret TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid', 'canceled', 'expired')),
            total_cents INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_event ON orders(event_id);
        CREATE INDEX IF NOT EXISTS idx_orders_event_status ON orders(event_id, status);

        -- Payments (mutated only by the reconciliation core, never deleted)
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            provider TEXT NOT NULL,
            state TEXT NOT NULL CHECK (state IN ('created', 'pending', 'confirmed', 'canceled', 'failed', 'refunded')),
            amount_cents INTEGER NOT NULL,
            info TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_order ON payments(order_id);

        -- Refunds (created by the core when the gateway reports one we don't know)
        CREATE TABLE IF NOT EXISTS refunds (
            id TEXT PRIMARY KEY,
            payment_id TEXT NOT NULL REFERENCES payments(id) ON DELETE CASCADE,
            state TEXT NOT NULL CHECK (state IN ('created', 'transit', 'done', 'external')),
            amount_cents INTEGER NOT NULL,
            gateway_id TEXT,
            info TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_refunds_payment ON refunds(payment_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_refunds_gateway_id
            ON refunds(payment_id, gateway_id) WHERE gateway_id IS NOT NULL;

        -- Gateway reference index (preference/sale/parent-payment/refund ids
        -- to local rows; the only way webhooks resolve payments)
        CREATE TABLE IF NOT EXISTS gateway_refs (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL UNIQUE,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            payment_id TEXT REFERENCES payments(id) ON DELETE CASCADE,
            refund_id TEXT REFERENCES refunds(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_gateway_refs_order ON gateway_refs(order_id);
        CREATE INDEX IF NOT EXISTS idx_gateway_refs_payment ON gateway_refs(payment_id);

        -- Order audit log (append-only; raw webhook payloads land here
        -- before any mutation)
        CREATE TABLE IF NOT EXISTS order_log (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            action TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_log_order ON order_log(order_id, created_at);
        "#,
    )?;
    Ok(())
}
