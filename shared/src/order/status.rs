//! Order status enum and the pure state machine
//!
//! # Transition table
//!
//! | Event                | Valid from                               | Result    |
//! |----------------------|------------------------------------------|-----------|
//! | PaymentSucceeded     | pending                                  | confirmed |
//! | PaymentFailed        | pending                                  | cancelled |
//! | AdvanceFulfillment   | confirmed / processing / shipped         | next step |
//! | Cancel               | pending / confirmed                      | cancelled |
//! | RefundIssued         | confirmed / processing / shipped / delivered | refunded |
//!
//! Any pair not in the table is rejected with [`InvalidTransition`] and the
//! request is a no-op: no history entry, no status change.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Order lifecycle status
///
/// `pending` is the sole initial state. `cancelled` and `refunded` are fully
/// terminal; `delivered` is terminal for fulfillment but may still be
/// refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// String form as stored in the database and serialized over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Whether no further transition of any kind is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Logical events that drive order status transitions
///
/// Both client-driven confirmations and webhook deliveries map onto these
/// events, so duplicate or out-of-order delivery funnels through a single
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    /// Gateway reported the payment intent succeeded
    PaymentSucceeded,
    /// Gateway reported the payment failed or was cancelled
    PaymentFailed,
    /// Admin advances fulfillment one step
    AdvanceFulfillment,
    /// User or admin cancels the order
    Cancel,
    /// A refund was issued against the order's payment
    RefundIssued,
}

impl OrderEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentSucceeded => "payment_succeeded",
            Self::PaymentFailed => "payment_failed",
            Self::AdvanceFulfillment => "advance_fulfillment",
            Self::Cancel => "cancel",
            Self::RefundIssued => "refund_issued",
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition was requested that the table does not allow
///
/// Always safe and non-destructive. Callers treat this as a benign no-op
/// under races and re-read the order state instead of retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event} to order in status {from}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub event: OrderEvent,
}

/// Pure transition function: current status + event -> new status
///
/// The only place in the codebase that knows which transitions are legal.
pub fn transition(from: OrderStatus, event: OrderEvent) -> Result<OrderStatus, InvalidTransition> {
    use OrderEvent::*;
    use OrderStatus::*;

    let to = match (from, event) {
        (Pending, PaymentSucceeded) => Confirmed,
        (Pending, PaymentFailed) => Cancelled,
        (Confirmed, AdvanceFulfillment) => Processing,
        (Processing, AdvanceFulfillment) => Shipped,
        (Shipped, AdvanceFulfillment) => Delivered,
        (Pending | Confirmed, Cancel) => Cancelled,
        (Confirmed | Processing | Shipped | Delivered, RefundIssued) => Refunded,
        _ => return Err(InvalidTransition { from, event }),
    };
    Ok(to)
}
