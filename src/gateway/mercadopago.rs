use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::money;

/// MercadoPago API client. The gateway is the source of truth for payment
/// and refund state; every untrusted signal (redirect params, webhook
/// payloads) is re-verified through these calls before any ledger mutation.
#[derive(Debug, Clone)]
pub struct MercadoPagoClient {
    client: Client,
    base_url: String,
    access_token: String,
}

/// Monetary amount as reported by the gateway, e.g. {"value": "12.50"}.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayAmount {
    pub value: String,
    #[serde(default)]
    pub currency: Option<String>,
}

impl GatewayAmount {
    pub fn to_cents(&self) -> Result<i64> {
        money::parse_cents(&self.value)
            .ok_or_else(|| AppError::Gateway(format!("unparseable amount: {:?}", self.value)))
    }
}

/// The gateway's record of a payment, fetched during the return flow.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    /// Our reference as echoed back by the gateway (the local payment id)
    pub external_reference: String,
    pub status: String,
    pub status_detail: String,
}

/// The gateway's record of a sale/preference, fetched during webhook handling.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySale {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub total_refunded_amount: Option<GatewayAmount>,
}

/// The gateway's record of an individual refund.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    pub state: String,
    pub amount: GatewayAmount,
    /// Cumulative refunded amount across all refunds of the sale, when the
    /// gateway includes it. Covers refunds it never individually notified.
    #[serde(default)]
    pub total_refunded_amount: Option<GatewayAmount>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutPreference {
    pub id: String,
    /// Buyer-facing checkout URL
    pub init_point: String,
}

impl MercadoPagoClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to parse {} response: {}", path, e)))
    }

    /// Fetch the authoritative record of a payment by collection id.
    pub async fn get_payment(&self, id: &str) -> Result<GatewayPayment> {
        self.get_json(&format!("/v1/payments/{}", id)).await
    }

    /// Fetch the authoritative sale/preference record by id.
    pub async fn get_preference(&self, id: &str) -> Result<GatewaySale> {
        self.get_json(&format!("/v1/sales/{}", id)).await
    }

    /// Fetch an individual refund record by id.
    pub async fn get_refund(&self, id: &str) -> Result<GatewayRefund> {
        self.get_json(&format!("/v1/refunds/{}", id)).await
    }

    /// Create a checkout preference for a payment. `external_reference` is
    /// the local payment id; the gateway echoes it back on the return flow.
    pub async fn create_preference(
        &self,
        external_reference: &str,
        title: &str,
        amount_cents: i64,
        currency: &str,
        back_url: &str,
        notification_url: &str,
    ) -> Result<CheckoutPreference> {
        let body = json!({
            "external_reference": external_reference,
            "items": [{
                "title": title,
                "quantity": 1,
                "unit_price": money::format_cents(amount_cents),
                "currency_id": currency.to_uppercase(),
            }],
            "back_urls": {
                "success": back_url,
                "pending": back_url,
                "failure": back_url,
            },
            "notification_url": notification_url,
            "auto_return": "approved",
        });

        let response = self
            .client
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "preference creation returned {}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("failed to parse preference response: {}", e)))
    }
}
