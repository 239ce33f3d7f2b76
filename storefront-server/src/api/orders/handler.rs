//! Order endpoint handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderDetail, OrderStatusHistory};
use crate::db::repository::{OrderFilter, OrderRepository};
use crate::orders::ledger::CheckoutRequest;
use crate::orders::OrderLedger;
use shared::order::{OrderEvent, OrderStatus};
use shared::{ApiResponse, AppError, AppResult};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    fn into_filter(self) -> OrderFilter {
        OrderFilter {
            status: self.status,
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

/// Admin status action: move fulfillment forward or cancel
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub action: StatusAction,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Advance,
    Cancel,
}

fn ledger(state: &ServerState) -> OrderLedger {
    OrderLedger::new(state.get_db(), state.config.clone(), state.coupons.clone())
}

fn orders(state: &ServerState) -> OrderRepository {
    OrderRepository::new(state.get_db())
}

/// POST /api/orders - convert the cart into a pending order
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = ledger(&state).checkout(&user.id, request).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// GET /api/orders - list the caller's orders
pub async fn list_own(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let list = orders(&state)
        .list_for_user(&user.id, &query.into_filter())
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/orders/admin/all - list every order
pub async fn list_all(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    user.require_admin()?;
    let list = orders(&state)
        .list_all(&query.into_filter())
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /api/orders/{id} - order with items
pub async fn get_detail(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = orders(&state)
        .find_detail(&id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::order_not_found(&id))?;
    user.require_owner(&detail.order.user_id)?;
    Ok(Json(ApiResponse::success(detail)))
}

/// GET /api/orders/{id}/history - full status history
///
/// The status/history consistency invariant is checked on every read; a
/// mismatch is a broken write path and surfaces as a 500.
pub async fn get_history(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<OrderStatusHistory>>>> {
    let repo = orders(&state);
    let order = repo
        .find_by_id(&id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::order_not_found(&id))?;
    user.require_owner(&order.user_id)?;

    repo.verify_consistency(&id).await.map_err(AppError::from)?;
    let history = repo.history(&id).await.map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(history)))
}

/// PUT /api/orders/{id}/cancel - cancel a pre-settlement order
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let repo = orders(&state);
    let order = repo
        .find_by_id(&id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::order_not_found(&id))?;
    user.require_owner(&order.user_id)?;

    let updated = repo
        .apply_transition(
            &id,
            OrderEvent::Cancel,
            Some("Order cancelled by user".to_string()),
        )
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(updated)))
}

/// PUT /api/orders/{id}/status - admin fulfillment action
pub async fn admin_update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    user.require_admin()?;

    let event = match request.action {
        StatusAction::Advance => OrderEvent::AdvanceFulfillment,
        StatusAction::Cancel => OrderEvent::Cancel,
    };

    let updated = orders(&state)
        .apply_transition(&id, event, request.notes)
        .await
        .map_err(AppError::from)?;
    Ok(Json(ApiResponse::success(updated)))
}
