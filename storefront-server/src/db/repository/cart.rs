//! Cart Repository
//!
//! Read side of checkout. The cart clear itself happens inside the order
//! creation transaction, not here.

use super::RepoResult;
use crate::db::models::CartItem;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All cart lines for a user, in the order they were added
    pub async fn line_items(&self, user_id: &str) -> RepoResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT * FROM cart_items WHERE user_id = ? ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Add a line to a user's cart
    pub async fn add_line(
        &self,
        user_id: &str,
        product_id: &str,
        product_name: &str,
        product_sku: &str,
        unit_price: f64,
        quantity: i64,
    ) -> RepoResult<CartItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, user_id, product_id, product_name, product_sku,
                unit_price, quantity, product_image, product_weight, product_unit, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, NULL, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(product_id)
        .bind(product_name)
        .bind(product_sku)
        .bind(unit_price)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(CartItem {
            id,
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            product_sku: product_sku.to_string(),
            unit_price,
            quantity,
            product_image: None,
            product_weight: None,
            product_unit: None,
            created_at: now,
        })
    }
}
