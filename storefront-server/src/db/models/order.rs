//! Order, order item and status history models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::OrderStatus;

/// Order entity - one per checkout transaction
///
/// Totals are computed once at creation and never recomputed; refunds are
/// recorded as history facts, not by mutating these fields. `status` is
/// mutated only through the transition path in the order repository.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    /// Human-readable, globally unique, never reused
    pub order_number: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub delivery_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    /// Amounts in major currency units
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub discount_amount: f64,
    /// Invariant: subtotal + tax_amount + delivery_fee - discount_amount
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every status change
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of one purchased line
///
/// Captures product identity and price at checkout time so later catalog
/// edits cannot retroactively change a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub product_image: Option<String>,
    pub product_weight: Option<String>,
    pub product_unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit entry; one row per accepted transition plus notes
/// appended without a transition (e.g. dispute follow-ups)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderStatusHistory {
    /// Per-database sequence preserving read order
    pub seq: i64,
    pub id: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub item_count: i64,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let item_count = items.iter().map(|i| i.quantity).sum();
        Self {
            order,
            items,
            item_count,
        }
    }
}

/// Payload for inserting a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub order_number: String,
    pub delivery_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
}

/// Payload for inserting one order item
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub product_image: Option<String>,
    pub product_weight: Option<String>,
    pub product_unit: Option<String>,
}
