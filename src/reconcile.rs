//! Payment-status reconciliation core.
//!
//! Both entry points (return flow and webhook) feed re-verified gateway
//! records into these functions, which decide the local ledger mutation.
//! Every mutation is re-derivable from the authoritative gateway state, so
//! duplicate or out-of-order delivery converges on the same end state.

use rusqlite::Connection;
use serde_json::json;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::gateway::{GatewayPayment, GatewayRefund, GatewaySale};
use crate::models::{ConfirmOutcome, Order, OrderStatus, Payment, PaymentState};

/// Translate a gateway status string into the local (order, payment) pair.
/// Unmapped statuses yield `None`: no transition, info recorded, log only.
pub fn map_status(gateway_status: &str) -> Option<(OrderStatus, PaymentState)> {
    match gateway_status {
        "approved" => Some((OrderStatus::Paid, PaymentState::Confirmed)),
        "pending" | "authorized" | "in_process" | "in_mediation" => {
            Some((OrderStatus::Pending, PaymentState::Pending))
        }
        "cancelled" => Some((OrderStatus::Canceled, PaymentState::Canceled)),
        "rejected" => Some((OrderStatus::Canceled, PaymentState::Failed)),
        "refunded" | "charged_back" => Some((OrderStatus::Canceled, PaymentState::Refunded)),
        _ => None,
    }
}

/// Check the buyer-supplied return parameters against the gateway's own
/// record. Any disagreement is a possible spoofing attempt: reject with no
/// mutation.
pub fn verify_return_signal(
    gateway: &GatewayPayment,
    claimed_reference: &str,
    claimed_status: &str,
) -> Result<()> {
    if gateway.external_reference != claimed_reference {
        return Err(AppError::BadRequest(format!(
            "Invalid attempt to pay order {}",
            claimed_reference
        )));
    }
    if gateway.status != claimed_status {
        return Err(AppError::BadRequest(format!(
            "Invalid attempt to pay order {}",
            claimed_reference
        )));
    }
    Ok(())
}

/// Apply the gateway's verified payment record on the return flow: map the
/// status, persist order + payment together, and always record the status
/// detail. Returns the refreshed order for the redirect decision.
pub fn apply_return(
    conn: &mut Connection,
    payment: &Payment,
    gateway: &GatewayPayment,
) -> Result<Order> {
    match map_status(&gateway.status) {
        Some((order_status, payment_state)) => {
            queries::apply_payment_status(
                conn,
                payment,
                order_status,
                payment_state,
                &gateway.status_detail,
            )?;
        }
        None => {
            tracing::warn!(
                "Unmapped gateway status '{}' for payment {}; recording detail only",
                gateway.status,
                payment.id
            );
            queries::record_payment_info(conn, &payment.id, &gateway.status_detail)?;
        }
    }

    queries::get_order_by_id(conn, &payment.order_id)?
        .ok_or_else(|| AppError::Internal(format!("Order {} missing", payment.order_id)))
}

/// Outcome of reconciling a sale notification against a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// Payment confirmed, order paid
    Confirmed,
    /// Confirmation refused: event capacity exhausted (logged no-op)
    QuotaExceeded,
    /// A full-refund shortfall was recorded
    RefundRecorded { amount_cents: i64 },
    /// Nothing to do for this (payment state, sale state) combination
    NoChange,
}

fn in_refund_path(payment: &Payment, sale_state: &str) -> bool {
    // `confirmed` enters the refund path; `refunded` stays on it so
    // redelivered notifications can re-run the (idempotent) bookkeeping.
    matches!(
        payment.state,
        PaymentState::Confirmed | PaymentState::Refunded
    ) && matches!(sale_state, "partially_refunded" | "refunded")
}

/// Reconcile a `sale` notification: confirm completed sales, or record the
/// shortfall refund when the gateway reports the sale fully refunded.
pub fn apply_sale(
    conn: &mut Connection,
    payment: &Payment,
    sale: &GatewaySale,
) -> Result<SaleOutcome> {
    if in_refund_path(payment, &sale.state) {
        if sale.state != "refunded" {
            // Partial refunds are reconciled per-refund via refund resources.
            return Ok(SaleOutcome::NoChange);
        }
        // A fully refunded sale implies cumulative refunds equal to the
        // payment amount; record exactly the part we don't know about yet.
        let known_sum = queries::refund_known_sum(conn, &payment.id)?;
        let shortfall = payment.amount_cents - known_sum;
        if shortfall > 0 {
            queries::create_external_refund(conn, payment, shortfall, None, None)?;
            return Ok(SaleOutcome::RefundRecorded {
                amount_cents: shortfall,
            });
        }
        return Ok(SaleOutcome::NoChange);
    }

    if payment.state.is_confirmable() && sale.state == "completed" {
        return match queries::confirm_payment(conn, &payment.id)? {
            ConfirmOutcome::Confirmed => Ok(SaleOutcome::Confirmed),
            ConfirmOutcome::QuotaExceeded => {
                tracing::warn!(
                    "Confirmation of payment {} refused: event capacity exhausted",
                    payment.id
                );
                Ok(SaleOutcome::QuotaExceeded)
            }
        };
    }

    Ok(SaleOutcome::NoChange)
}

/// What a refund notification ended up changing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefundReport {
    /// Amount of a newly recorded external refund (gateway refund unknown locally)
    pub recorded_cents: Option<i64>,
    /// A known created/in-transit refund was completed
    pub marked_done: bool,
    /// Amount of the delta refund covering un-notified gateway refunds
    pub delta_cents: Option<i64>,
}

/// Reconcile a `refund` notification against the payment's refund ledger.
///
/// Returns `None` when the payment is not on the refund path (the
/// notification is acknowledged but inert). The delta computation only ever
/// adds the remaining difference toward the gateway's cumulative figure
/// (clamped to the payment amount), which is what makes redelivery safe.
pub fn apply_refund(
    conn: &mut Connection,
    payment: &Payment,
    sale: &GatewaySale,
    gateway_refund: &GatewayRefund,
) -> Result<Option<RefundReport>> {
    if !in_refund_path(payment, &sale.state) {
        return Ok(None);
    }

    let mut report = RefundReport::default();

    match queries::get_refund_by_gateway_id(conn, &payment.id, &gateway_refund.id)? {
        None => {
            let amount = gateway_refund.amount.to_cents()?.abs();
            let info = json!({
                "id": gateway_refund.id,
                "state": gateway_refund.state,
                "amount": gateway_refund.amount.value,
            })
            .to_string();
            queries::create_external_refund(
                conn,
                payment,
                amount,
                Some(&gateway_refund.id),
                Some(&info),
            )?;
            report.recorded_cents = Some(amount);
        }
        Some(local) => {
            if matches!(
                local.state,
                crate::models::RefundState::Created | crate::models::RefundState::Transit
            ) && gateway_refund.state == "completed"
            {
                queries::mark_refund_done(conn, &local.id)?;
                report.marked_done = true;
            }
        }
    }

    if let Some(total) = &gateway_refund.total_refunded_amount {
        let target = total.to_cents()?.min(payment.amount_cents);
        let known_sum = queries::refund_known_sum(conn, &payment.id)?;
        if known_sum < target {
            let delta = target - known_sum;
            queries::create_external_refund(conn, payment, delta, None, None)?;
            report.delta_cents = Some(delta);
        }
    }

    Ok(Some(report))
}
