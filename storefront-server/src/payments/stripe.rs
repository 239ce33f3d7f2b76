//! Stripe gateway adapter
//!
//! Thin HTTP client over the Stripe REST API. Requests are form-encoded,
//! authenticated with the secret key, and bounded by the configured timeout.
//! Only the fields the orchestrator needs are deserialized.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::gateway::{GatewayError, PaymentGateway, PaymentIntent, Refund};

const API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    client: Client,
    secret_key: String,
}

impl StripeGateway {
    /// Build an adapter from the configured secret key and timeout
    pub fn new(secret_key: &str, timeout_ms: u64) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            client,
            secret_key: secret_key.to_string(),
        })
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.secret_key.is_empty() {
            return Err(GatewayError::NotConfigured(
                "STRIPE_SECRET_KEY is not set".into(),
            ));
        }
        Ok(())
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", API_BASE, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Api(format!("{}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Api(format!("{}: {}", status, body)));
        }

        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        self.ensure_configured()?;

        let mut form: Vec<(String, String)> = vec![
            ("amount".into(), amount_minor.to_string()),
            ("currency".into(), currency.to_string()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }

        debug!(amount_minor, currency, "Creating payment intent");
        self.post_form("/payment_intents", &form).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.ensure_configured()?;
        self.get(&format!("/payment_intents/{}", intent_id)).await
    }

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<Refund, GatewayError> {
        self.ensure_configured()?;

        let mut form: Vec<(String, String)> =
            vec![("payment_intent".into(), intent_id.to_string())];
        if let Some(amount) = amount_minor {
            form.push(("amount".into(), amount.to_string()));
        }

        debug!(intent_id, "Creating refund");
        self.post_form("/refunds", &form).await
    }
}
