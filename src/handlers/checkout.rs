use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::OrderStatus;

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub checkout_url: String,
    pub payment_id: String,
}

/// Creates a payment for an order and a matching checkout preference at the
/// gateway. The buyer finishes the flow on the gateway's hosted page and comes
/// back through the return handler.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PayResponse>> {
    let conn = state.db.get()?;

    let order = queries::get_order_by_code(&conn, &code)?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    if order.secret != req.secret {
        return Err(AppError::NotFound("Order not found".into()));
    }
    match order.status {
        OrderStatus::Pending => {}
        OrderStatus::Paid => {
            return Err(AppError::BadRequest("Order is already paid".into()));
        }
        OrderStatus::Canceled | OrderStatus::Expired => {
            return Err(AppError::BadRequest(
                "Order can no longer be paid".into(),
            ));
        }
    }

    let event = queries::get_event_by_id(&conn, &order.event_id)?
        .ok_or_else(|| AppError::Internal("Order references a missing event".into()))?;

    let payment = queries::create_payment(&conn, &order.id, order.total_cents)?;

    let back_url = format!("{}/return/mercadopago", state.base_url);
    let notification_url = format!(
        "{}/events/{}/webhook/mercadopago",
        state.base_url, event.slug
    );
    let preference = state
        .gateway
        .create_preference(
            &payment.id,
            &format!("{} order {}", event.name, order.code),
            payment.amount_cents,
            &event.currency,
            &back_url,
            &notification_url,
        )
        .await?;

    // Remember the preference id so later notifications can find their way
    // back to this payment.
    queries::create_gateway_ref(&conn, &preference.id, &order.id, Some(&payment.id))?;
    queries::log_order_event(
        &conn,
        &order.id,
        "mercadopago.payment.created",
        &json!({ "payment_id": payment.id, "preference_id": preference.id }),
    )?;

    info!(order = %order.code, payment = %payment.id, "created checkout preference");

    Ok(Json(PayResponse {
        checkout_url: preference.init_point,
        payment_id: payment.id,
    }))
}
