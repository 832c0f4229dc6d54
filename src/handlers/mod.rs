pub mod checkout;
pub mod return_flow;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{code}/pay", post(checkout::initiate_payment))
        .route("/return/mercadopago", get(return_flow::payment_return))
        .route("/webhook/mercadopago", post(webhook::handle_webhook))
        .route(
            "/events/{slug}/webhook/mercadopago",
            post(webhook::handle_scoped_webhook),
        )
}
