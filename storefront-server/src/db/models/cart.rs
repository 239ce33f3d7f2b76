//! Cart line model
//!
//! Cart rows carry the product snapshot (name, sku, price) captured when the
//! line was added, so checkout never needs to reach back into the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One purchasable line in a user's cart
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub product_image: Option<String>,
    pub product_weight: Option<String>,
    pub product_unit: Option<String>,
    pub created_at: DateTime<Utc>,
}
