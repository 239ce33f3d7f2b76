//! Payments API
//!
//! | Method | Path | Access | Description |
//! |--------|------|--------|-------------|
//! | POST | /api/payments/orders/{id}/intent | owner | Create a payment intent |
//! | POST | /api/payments/orders/{id}/confirm | owner | Confirm client-side payment |
//! | POST | /api/payments/orders/{id}/refund | admin | Refund a settled order |

mod handler;

use axum::routing::post;
use axum::Router;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/payments/orders/{id}/intent",
            post(handler::create_intent),
        )
        .route(
            "/api/payments/orders/{id}/confirm",
            post(handler::confirm),
        )
        .route(
            "/api/payments/orders/{id}/refund",
            post(handler::refund),
        )
}
