use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::Query;
use crate::models::OrderStatus;
use crate::reconcile;

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub external_reference: String,
    pub collection_id: String,
    pub collection_status: String,
}

/// Landing point for the buyer after the gateway's hosted checkout. The query
/// string is attacker-controlled, so every claim in it is checked against a
/// fresh fetch of the payment before the ledger moves.
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Result<Redirect> {
    let gateway_payment = state.gateway.get_payment(&query.collection_id).await?;
    reconcile::verify_return_signal(
        &gateway_payment,
        &query.external_reference,
        &query.collection_status,
    )?;

    let mut conn = state.db.get()?;
    let payment = match queries::get_payment_by_id(&conn, &query.external_reference)? {
        Some(payment) => payment,
        None => {
            warn!(
                reference = %query.external_reference,
                "return for unknown payment, sending buyer back to checkout"
            );
            return Ok(Redirect::to(&format!(
                "{}/checkout/confirm",
                state.shop_url
            )));
        }
    };

    let order = reconcile::apply_return(&mut conn, &payment, &gateway_payment)?;

    info!(
        order = %order.code,
        status = order.status.as_ref(),
        "buyer returned from checkout"
    );

    let mut url = format!(
        "{}/order/{}/{}",
        state.shop_url,
        urlencoding::encode(&order.code),
        urlencoding::encode(&order.secret)
    );
    if order.status == OrderStatus::Paid {
        url.push_str("?paid=yes");
    }
    Ok(Redirect::to(&url))
}
