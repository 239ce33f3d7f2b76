//! Payment endpoint handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::payments::gateway::{PaymentIntent, Refund};
use crate::payments::{ConfirmOutcome, PaymentOrchestrator};
use shared::{ApiResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub intent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub intent_id: String,
    /// Partial refund amount in minor units; full refund when omitted
    pub amount_minor: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub order: Order,
    pub refund: Refund,
}

fn orchestrator(state: &ServerState) -> PaymentOrchestrator {
    PaymentOrchestrator::new(
        state.get_db(),
        state.gateway.clone(),
        &state.config.currency,
    )
}

/// POST /api/payments/orders/{id}/intent
pub async fn create_intent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<PaymentIntent>>> {
    let intent = orchestrator(&state)
        .create_intent_for_order(&id, &user)
        .await?;
    Ok(Json(ApiResponse::success(intent)))
}

/// POST /api/payments/orders/{id}/confirm
pub async fn confirm(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<ConfirmOutcome>>> {
    let outcome = orchestrator(&state)
        .confirm_client_side(&id, &request.intent_id, &user)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /api/payments/orders/{id}/refund
pub async fn refund(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<RefundRequest>,
) -> AppResult<Json<ApiResponse<RefundResponse>>> {
    let (order, refund) = orchestrator(&state)
        .refund(&id, &request.intent_id, request.amount_minor, &user)
        .await?;
    Ok(Json(ApiResponse::success(RefundResponse { order, refund })))
}
