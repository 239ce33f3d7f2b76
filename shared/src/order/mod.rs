//! Order status and transition logic
//!
//! The status enum and its transition table live here so every layer
//! (storage, orchestration, webhook reconciliation, API) consumes the same
//! definition instead of redeclaring status strings.

mod status;

pub use status::{transition, InvalidTransition, OrderEvent, OrderStatus};
