use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Refund lifecycle. `External` marks refunds first seen on the gateway
/// side rather than initiated locally. Every state counts toward the known
/// refunded sum: a created or in-transit refund already reserves its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RefundState {
    Created,
    Transit,
    Done,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub payment_id: String,
    pub state: RefundState,
    pub amount_cents: i64,
    /// Gateway-assigned refund id, when the gateway notified us individually
    pub gateway_id: Option<String>,
    pub info: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
