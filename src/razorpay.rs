//! Razorpay integration via REST API (no SDK dependency).
//!
//! The backend creates a provider order, the storefront collects the payment
//! client-side, and the backend verifies the returned signature:
//! `HMAC-SHA256("{order_id}|{payment_id}", key_secret)` hex-encoded.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{AppError, AppResult};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    key_id: String,
    key_secret: String,
}

/// Provider-side order as returned by `POST /v1/orders`.
#[derive(Debug, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            key_id,
            key_secret,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a provider order for `amount` minor units. `receipt` is our
    /// own order reference, echoed back in the provider dashboard.
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> AppResult<ProviderOrder> {
        let body = serde_json::json!({
            "amount": amount,
            "currency": currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(format!("{RAZORPAY_API_BASE}/orders"))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentProvider(format!(
                "order create failed: {status} {text}"
            )));
        }

        response
            .json::<ProviderOrder>()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))
    }

    /// Verify the checkout signature handed back by the storefront.
    /// Constant-time comparison via `Mac::verify_slice`.
    pub fn verify_signature(
        &self,
        provider_order_id: &str,
        provider_payment_id: &str,
        signature_hex: &str,
    ) -> bool {
        verify_signature(
            &self.key_secret,
            provider_order_id,
            provider_payment_id,
            signature_hex,
        )
    }
}

pub fn verify_signature(
    key_secret: &str,
    provider_order_id: &str,
    provider_payment_id: &str,
    signature_hex: &str,
) -> bool {
    let payload = format!("{provider_order_id}|{provider_payment_id}");
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key_secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());

    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_valid_signature() {
        let sig = sign("secret", "order_abc|pay_def");
        assert!(verify_signature("secret", "order_abc", "pay_def", &sig));
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let sig = sign("secret", "order_abc|pay_def");
        assert!(!verify_signature("secret", "order_abc", "pay_other", &sig));
        assert!(!verify_signature("wrong", "order_abc", "pay_def", &sig));
    }

    #[test]
    fn rejects_garbage_hex() {
        assert!(!verify_signature("secret", "order_abc", "pay_def", "zz-not-hex"));
    }
}
