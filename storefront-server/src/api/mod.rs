//! API Module
//!
//! HTTP surface of the server. One submodule per resource, each exposing a
//! `router()` merged by the server.
//!
//! | Module | Prefix | Description |
//! |--------|--------|-------------|
//! | health | /api/health | Liveness probe |
//! | orders | /api/orders | Checkout, order queries, transitions |
//! | payments | /api/payments | Intent lifecycle and refunds |
//! | webhooks | /api/webhooks | Gateway webhook ingestion |

pub mod health;
pub mod orders;
pub mod payments;
pub mod webhooks;
