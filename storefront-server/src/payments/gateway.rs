//! Payment gateway seam
//!
//! The orchestrator and the tests talk to this trait, never to Stripe
//! directly. Amounts cross this boundary in minor units (cents) because that
//! is how every card gateway counts money.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Intent states as reported by the gateway
///
/// Unrecognized values map to `Unknown` instead of failing deserialization;
/// gateways add states without notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// A payment intent held at the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Secret handed to the browser to complete payment client-side
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A refund issued against an intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: RefundStatus,
    /// Amount in minor units
    pub amount: i64,
}

/// Gateway adapter errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Request(String),

    #[error("Gateway rejected the request: {0}")]
    Api(String),

    #[error("Gateway returned an unreadable response: {0}")]
    Decode(String),

    #[error("Gateway is not configured: {0}")]
    NotConfigured(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured(msg) => AppError::with_message(ErrorCode::ConfigError, msg),
            other => AppError::gateway(other.to_string()),
        }
    }
}

/// Payment gateway operations used by the orchestrator
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount_minor` in `currency`, tagged with
    /// correlation metadata
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Fetch the current server-side view of an intent
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError>;

    /// Refund an intent, fully when `amount_minor` is `None`
    async fn create_refund(
        &self,
        intent_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<Refund, GatewayError>;
}
