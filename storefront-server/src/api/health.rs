//! Health check endpoint

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::core::ServerState;
use shared::ApiResponse;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": "storefront-server",
    })))
}
