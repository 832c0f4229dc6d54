use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Local payment lifecycle.
///
/// Observed transitions: created -> pending -> confirmed -> refunded, with
/// created|pending -> canceled|failed as absorbing error transitions.
/// Nothing leaves `confirmed` except the refund path, and canceled/failed/
/// refunded are terminal apart from idempotent refund bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentState {
    Created,
    Pending,
    Confirmed,
    Canceled,
    Failed,
    Refunded,
}

impl PaymentState {
    /// States from which a `completed` sale notification may confirm.
    pub fn is_confirmable(self) -> bool {
        matches!(
            self,
            PaymentState::Created
                | PaymentState::Pending
                | PaymentState::Canceled
                | PaymentState::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Payment provider identifier, always "mercadopago" here
    pub provider: String,
    pub state: PaymentState,
    pub amount_cents: i64,
    /// Last-known gateway status detail, recorded on every reconciliation
    pub info: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of a confirmation attempt. Quota exhaustion is an expected
/// outcome, not an error: the payment stays unconfirmed and the gateway
/// must not be told to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    QuotaExceeded,
}
