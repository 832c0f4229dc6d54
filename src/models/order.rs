use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Buyer-facing order lifecycle. Derived from, but not identical to, the
/// payment state: an order is `paid` once any payment confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub event_id: String,
    /// Short buyer-facing code used in order links
    pub code: String,
    /// Secret appended to buyer-facing links, not an auth credential beyond that
    pub secret: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Append-only audit row recorded against an order. Webhook payloads are
/// logged here before any mutation is applied.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLogEntry {
    pub id: String,
    pub order_id: String,
    pub action: String,
    /// Raw JSON payload associated with the action
    pub data: String,
    pub created_at: i64,
}
