//! Webhook Reconciler
//!
//! Folds asynchronous gateway notifications into the order state machine.
//! Deliveries are verified, then reconciled idempotently: an event that has
//! already been applied through another path (usually the client-side
//! confirmation racing the webhook) is acknowledged without effect, because
//! the gateway retries anything that is not acknowledged.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository::{OrderRepository, RepoError};
use crate::payments::signature::verify_signature;
use shared::order::OrderEvent;
use shared::{AppError, AppResult, ErrorCode};

/// Gateway event kinds the reconciler reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventKind {
    #[serde(rename = "payment_intent.succeeded")]
    IntentSucceeded,
    #[serde(rename = "payment_intent.payment_failed")]
    IntentFailed,
    #[serde(rename = "payment_intent.canceled")]
    IntentCanceled,
    #[serde(rename = "charge.dispute.created")]
    DisputeCreated,
    #[serde(other)]
    Other,
}

/// Webhook delivery envelope, reduced to the fields reconciliation needs
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: EventKind,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    #[serde(default)]
    id: String,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

/// Acknowledgement returned to the gateway
///
/// `outcome` is informational; any 2xx stops redelivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: String,
}

impl WebhookAck {
    fn outcome(outcome: impl Into<String>) -> Self {
        Self {
            received: true,
            outcome: outcome.into(),
        }
    }
}

pub struct WebhookReconciler {
    orders: OrderRepository,
    webhook_secret: String,
    tolerance_secs: i64,
}

impl WebhookReconciler {
    pub fn new(pool: SqlitePool, webhook_secret: &str, tolerance_secs: i64) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            webhook_secret: webhook_secret.to_string(),
            tolerance_secs,
        }
    }

    /// Verify and reconcile one webhook delivery
    ///
    /// An unconfigured signing secret or a signature failure are the only
    /// rejections; everything past the signature check acknowledges, logging
    /// what could not be applied. Rejecting unapplied events would make the
    /// gateway redeliver them forever.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> AppResult<WebhookAck> {
        // No secret means no way to authenticate deliveries; reject them all
        // rather than accept forged events.
        if self.webhook_secret.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::ConfigError,
                "STRIPE_WEBHOOK_SECRET is not set",
            ));
        }

        let header = signature_header
            .ok_or_else(|| AppError::signature_invalid("Missing signature header"))?;
        verify_signature(
            payload,
            header,
            &self.webhook_secret,
            self.tolerance_secs,
            Utc::now().timestamp(),
        )
        .map_err(|e| AppError::signature_invalid(e.to_string()))?;

        let event: WebhookEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!("Unparseable webhook payload: {}", err);
                return Ok(WebhookAck::outcome("ignored: unparseable payload"));
            }
        };

        let object_id = event.data.object.id.clone();
        let Some(order_id) = event.data.object.metadata.get("order_id").cloned() else {
            warn!(object_id = %object_id, "Webhook event has no order correlation");
            return Ok(WebhookAck::outcome("ignored: no order correlation"));
        };

        match event.kind {
            EventKind::IntentSucceeded => {
                self.apply(
                    &order_id,
                    OrderEvent::PaymentSucceeded,
                    format!("Payment confirmed via webhook (intent {})", object_id),
                )
                .await
            }
            EventKind::IntentFailed | EventKind::IntentCanceled => {
                self.apply(
                    &order_id,
                    OrderEvent::PaymentFailed,
                    format!("Payment failed (intent {})", object_id),
                )
                .await
            }
            EventKind::DisputeCreated => {
                match self
                    .orders
                    .append_note(
                        &order_id,
                        &format!("Chargeback dispute opened ({})", object_id),
                    )
                    .await
                {
                    Ok(()) => {
                        info!(order_id = %order_id, object_id = %object_id, "Dispute recorded");
                        Ok(WebhookAck::outcome("applied: dispute noted"))
                    }
                    Err(RepoError::NotFound(_)) => {
                        warn!(order_id = %order_id, "Dispute for unknown order");
                        Ok(WebhookAck::outcome("ignored: unknown order"))
                    }
                    Err(err) => Err(err.into()),
                }
            }
            EventKind::Other => Ok(WebhookAck::outcome("ignored: unhandled event type")),
        }
    }

    /// Apply a state-machine event, treating invalid transitions as
    /// already-reconciled duplicates
    async fn apply(
        &self,
        order_id: &str,
        event: OrderEvent,
        note: String,
    ) -> AppResult<WebhookAck> {
        match self
            .orders
            .apply_transition(order_id, event, Some(note))
            .await
        {
            Ok(order) => {
                info!(order_id = %order_id, status = %order.status, "Webhook event applied");
                Ok(WebhookAck::outcome("applied"))
            }
            Err(RepoError::InvalidTransition(msg)) => {
                info!(order_id = %order_id, "Webhook event not applicable: {}", msg);
                Ok(WebhookAck::outcome("ignored: not applicable"))
            }
            Err(RepoError::NotFound(_)) => {
                warn!(order_id = %order_id, "Webhook event for unknown order");
                Ok(WebhookAck::outcome("ignored: unknown order"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
