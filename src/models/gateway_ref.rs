use serde::Serialize;

/// Lookup index mapping a gateway-assigned id (preference id, sale id,
/// parent-payment id, or refund id) to the local order/payment/refund that
/// produced it. Rows are written at payment-initiation and refund-creation
/// time; webhook resolution only ever reads them.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRef {
    pub id: String,
    /// The gateway-assigned id. Unique: a reference resolves to at most one payment.
    pub reference: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
    pub created_at: i64,
}
