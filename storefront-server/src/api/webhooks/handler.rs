//! Webhook endpoint handler
//!
//! Takes the raw body rather than a typed extractor; the signature covers
//! the exact bytes the gateway sent.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::core::ServerState;
use crate::payments::webhook::{WebhookAck, WebhookReconciler};
use shared::{ApiResponse, AppResult};

/// POST /api/webhooks/stripe
pub async fn stripe_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    let reconciler = WebhookReconciler::new(
        state.get_db(),
        &state.config.stripe_webhook_secret,
        state.config.webhook_tolerance_secs,
    );

    let ack = reconciler.handle(&body, signature).await?;
    Ok(Json(ApiResponse::success(ack)))
}
