//! Shared types for the storefront order/payment stack
//!
//! Common types used by the server and by tooling: the unified error
//! system, the order status enum with its transition table, and decimal
//! money helpers.

pub mod error;
pub mod money;
pub mod order;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use order::{OrderEvent, OrderStatus};
