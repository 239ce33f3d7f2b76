//! Webhooks API
//!
//! | Method | Path | Access | Description |
//! |--------|------|--------|-------------|
//! | POST | /api/webhooks/stripe | gateway | Signed webhook ingestion |

mod handler;

use axum::routing::post;
use axum::Router;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/webhooks/stripe", post(handler::stripe_webhook))
}
