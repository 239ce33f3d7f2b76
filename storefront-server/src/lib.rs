//! Storefront Server - order lifecycle and payment settlement
//!
//! # Architecture
//!
//! The server converts a shopping cart into an immutable order, drives the
//! order through a finite set of states, orchestrates the payment-intent
//! lifecycle against the gateway, and reconciles asynchronous webhook
//! notifications with synchronous client-driven confirmations.
//!
//! # Module structure
//!
//! ```text
//! storefront-server/src/
//! ├── core/       # Config, state, HTTP server
//! ├── auth/       # Identity extractor (upstream gateway injects headers)
//! ├── db/         # SQLite pool, models, repositories
//! ├── orders/     # Order ledger: checkout, totals, order numbers
//! ├── payments/   # Gateway adapter, orchestrator, webhook reconciler
//! ├── api/        # HTTP routes and handlers
//! └── utils/      # Logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod payments;
pub mod utils;

// Re-export public types
pub use auth::CurrentUser;
pub use core::{Config, Server, ServerState};
pub use orders::OrderLedger;
pub use payments::{PaymentGateway, PaymentOrchestrator, WebhookReconciler};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
