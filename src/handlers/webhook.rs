use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::Event;
use crate::reconcile;

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    resource_type: String,
    resource: WebhookResource,
}

#[derive(Debug, Deserialize)]
struct WebhookResource {
    id: String,
    #[serde(default)]
    sale_id: Option<String>,
    #[serde(default)]
    parent_payment: Option<String>,
}

/// Unscoped notification endpoint. Notifications that cannot be tied to a
/// known sale are acknowledged and dropped.
pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str)> {
    process(state, None, body).await
}

/// Event-scoped notification endpoint; the slug gives resolution a fallback
/// scope when no stored gateway reference matches.
pub async fn handle_scoped_webhook(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, &'static str)> {
    process(state, Some(slug), body).await
}

async fn process(
    state: AppState,
    event_slug: Option<String>,
    body: Bytes,
) -> Result<(StatusCode, &'static str)> {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "discarding malformed webhook payload");
            return Ok((StatusCode::BAD_REQUEST, "Malformed payload"));
        }
    };

    if payload.resource_type != "sale" && payload.resource_type != "refund" {
        info!(
            resource_type = %payload.resource_type,
            "ignoring webhook for unhandled resource type"
        );
        return Ok((StatusCode::OK, "Not a sale or refund notification"));
    }

    let sale_id = match payload.resource_type.as_str() {
        "sale" => payload.resource.id.clone(),
        _ => match payload.resource.sale_id.clone() {
            Some(sale_id) => sale_id,
            None => {
                warn!("refund notification without a sale reference");
                return Ok((StatusCode::OK, "Refund without sale reference"));
            }
        },
    };

    let mut conn = state.db.get()?;

    let mut references: Vec<&str> = vec![&sale_id];
    if let Some(parent) = payload.resource.parent_payment.as_deref() {
        references.push(parent);
    }
    let known_ref = queries::find_gateway_ref(&conn, &references)?;

    let event: Event = if let Some(known) = &known_ref {
        let order = queries::get_order_by_id(&conn, &known.order_id)?.ok_or_else(|| {
            AppError::Internal("Gateway reference points at a missing order".into())
        })?;
        queries::get_event_by_id(&conn, &order.event_id)?.ok_or_else(|| {
            AppError::Internal("Order references a missing event".into())
        })?
    } else if let Some(slug) = &event_slug {
        match queries::get_event_by_slug(&conn, slug)? {
            Some(event) => event,
            None => {
                warn!(slug = %slug, "webhook for unknown event");
                return Ok((StatusCode::OK, "Unable to detect event"));
            }
        }
    } else {
        warn!(sale = %sale_id, "webhook with no matching gateway reference");
        return Ok((StatusCode::OK, "Unable to detect event"));
    };

    // A verification failure here surfaces as a 5xx so the gateway retries
    // the notification later.
    let sale = state.gateway.get_preference(&sale_id).await?;

    let payment = match known_ref.as_ref().and_then(|r| r.payment_id.clone()) {
        Some(payment_id) => queries::get_payment_by_id(&conn, &payment_id)?,
        None => queries::find_payment_by_reference(&conn, &event.id, &sale.id)?,
    };
    let Some(payment) = payment else {
        warn!(sale = %sale.id, event = %event.slug, "no payment matches this sale");
        return Ok((StatusCode::OK, "Payment not found"));
    };

    // Audit trail first so even a no-op delivery leaves a trace.
    let raw: serde_json::Value = serde_json::from_slice(&body)?;
    queries::log_order_event(&conn, &payment.order_id, "mercadopago.event", &raw)?;

    if payload.resource_type == "refund" {
        let gateway_refund = state.gateway.get_refund(&payload.resource.id).await?;
        match reconcile::apply_refund(&mut conn, &payment, &sale, &gateway_refund)? {
            Some(report) => {
                info!(
                    payment = %payment.id,
                    recorded_cents = report.recorded_cents,
                    delta_cents = report.delta_cents,
                    marked_done = report.marked_done,
                    "processed refund notification"
                );
            }
            None => {
                // Not on the refund path; the sale may still carry a state
                // transition worth applying.
                let outcome = reconcile::apply_sale(&mut conn, &payment, &sale)?;
                info!(payment = %payment.id, ?outcome, "processed refund notification via sale state");
            }
        }
    } else {
        let outcome = reconcile::apply_sale(&mut conn, &payment, &sale)?;
        info!(payment = %payment.id, ?outcome, "processed sale notification");
    }

    Ok((StatusCode::OK, "OK"))
}
