//! Orders API
//!
//! | Method | Path | Access | Description |
//! |--------|------|--------|-------------|
//! | POST | /api/orders | user | Checkout the cart into an order |
//! | GET | /api/orders | user | List own orders |
//! | GET | /api/orders/{id} | owner | Order with items |
//! | GET | /api/orders/{id}/history | owner | Status history |
//! | PUT | /api/orders/{id}/cancel | owner | Cancel a pre-settlement order |
//! | GET | /api/orders/admin/all | admin | List all orders |
//! | PUT | /api/orders/{id}/status | admin | Advance or cancel fulfillment |

mod handler;

use axum::routing::{get, post, put};
use axum::Router;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::checkout).get(handler::list_own))
        .route("/api/orders/admin/all", get(handler::list_all))
        .route("/api/orders/{id}", get(handler::get_detail))
        .route("/api/orders/{id}/history", get(handler::get_history))
        .route("/api/orders/{id}/cancel", put(handler::cancel))
        .route("/api/orders/{id}/status", put(handler::admin_update_status))
}
