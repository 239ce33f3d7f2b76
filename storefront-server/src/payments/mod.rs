//! Payments Module
//!
//! Everything that touches money movement: the gateway seam, the Stripe
//! adapter behind it, the orchestrator that binds intents to orders, and the
//! webhook reconciler that folds asynchronous gateway events back into the
//! order state machine.
//!
//! ## Module structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | gateway | `PaymentGateway` trait and wire types |
//! | stripe | HTTP adapter for the Stripe API |
//! | signature | Webhook signature verification |
//! | orchestrator | Intent lifecycle bound to orders |
//! | webhook | Webhook event reconciliation |

pub mod gateway;
pub mod orchestrator;
pub mod signature;
pub mod stripe;
pub mod webhook;

pub use gateway::{GatewayError, IntentStatus, PaymentGateway, PaymentIntent, Refund, RefundStatus};
pub use orchestrator::{ConfirmOutcome, PaymentOrchestrator};
pub use stripe::StripeGateway;
pub use webhook::{WebhookAck, WebhookReconciler};
