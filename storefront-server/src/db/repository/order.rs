//! Order Repository
//!
//! Owns every write to the order ledger. Three rules hold on all paths:
//!
//! 1. Order creation, item snapshots, the initial history row and the cart
//!    clear commit in one transaction or not at all.
//! 2. A status transition is a single conditional update
//!    (`WHERE id = ? AND status = ?`); the loser of a race observes
//!    [`RepoError::InvalidTransition`] instead of corrupting history.
//! 3. Every accepted transition appends exactly one history row in the same
//!    transaction, so `orders.status` always matches the latest entry.

use super::{RepoError, RepoResult};
use crate::db::models::{NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatusHistory};
use chrono::Utc;
use shared::order::{transition, OrderEvent, OrderStatus};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Filter for order list queries
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an order from a cart snapshot, atomically
    ///
    /// Inserts the order, one item row per cart line, the initial `pending`
    /// history entry, and clears the user's cart in one transaction.
    /// The cart delete must remove exactly `expected_lines` rows; a mismatch
    /// means another checkout raced us (or the cart changed mid-flight) and
    /// the whole transaction rolls back.
    pub async fn create_checkout(
        &self,
        new_order: NewOrder,
        items: Vec<NewOrderItem>,
        expected_lines: u64,
    ) -> RepoResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let order_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status,
                delivery_address_id, billing_address_id,
                subtotal, tax_amount, delivery_fee, discount_amount, total_amount,
                notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order_id)
        .bind(&new_order.order_number)
        .bind(&new_order.user_id)
        .bind(OrderStatus::Pending)
        .bind(&new_order.delivery_address_id)
        .bind(&new_order.billing_address_id)
        .bind(new_order.subtotal)
        .bind(new_order.tax_amount)
        .bind(new_order.delivery_fee)
        .bind(new_order.discount_amount)
        .bind(new_order.total_amount)
        .bind(&new_order.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name, product_sku,
                    quantity, unit_price, total_price,
                    product_image, product_weight, product_unit, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_sku)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(&item.product_image)
            .bind(&item.product_weight)
            .bind(&item.product_unit)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO order_status_history (id, order_id, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&order_id)
        .bind(OrderStatus::Pending)
        .bind("Order created")
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(&new_order.user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted != expected_lines {
            // Dropping the transaction rolls everything back.
            return Err(RepoError::Conflict(format!(
                "Cart changed during checkout (expected {} lines, found {})",
                expected_lines, deleted
            )));
        }

        tx.commit().await?;

        // Read back through the normal query path
        self.find_detail(&order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Get order by id
    pub async fn find_by_id(&self, order_id: &str) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Get order with its line items
    pub async fn find_detail(&self, order_id: &str) -> RepoResult<Option<OrderDetail>> {
        let Some(order) = self.find_by_id(order_id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY created_at, id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderDetail::new(order, items)))
    }

    /// List a user's orders, newest first
    pub async fn list_for_user(&self, user_id: &str, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
        let orders = match filter.status {
            Some(status) => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT * FROM orders
                    WHERE user_id = ? AND status = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(user_id)
                .bind(status)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT * FROM orders
                    WHERE user_id = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(user_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(orders)
    }

    /// List all orders (admin), newest first
    pub async fn list_all(&self, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
        let orders = match filter.status {
            Some(status) => {
                sqlx::query_as::<_, Order>(
                    "SELECT * FROM orders WHERE status = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
                )
                .bind(status)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    "SELECT * FROM orders ORDER BY created_at DESC LIMIT ? OFFSET ?",
                )
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(orders)
    }

    /// Full status history for an order, in write order
    pub async fn history(&self, order_id: &str) -> RepoResult<Vec<OrderStatusHistory>> {
        let rows = sqlx::query_as::<_, OrderStatusHistory>(
            "SELECT * FROM order_status_history WHERE order_id = ? ORDER BY seq",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Apply a state-machine event to an order
    ///
    /// The update is conditional on the status observed in this transaction;
    /// zero affected rows means a concurrent transition won and this request
    /// resolves to `InvalidTransition` without touching history.
    pub async fn apply_transition(
        &self,
        order_id: &str,
        event: OrderEvent,
        notes: Option<String>,
    ) -> RepoResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))?;

        let target = transition(order.status, event)
            .map_err(|e| RepoError::InvalidTransition(e.to_string()))?;

        let now = Utc::now();
        let updated = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(target)
        .bind(now)
        .bind(order_id)
        .bind(order.status)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepoError::InvalidTransition(format!(
                "Order {} changed concurrently while applying {}",
                order_id, event
            )));
        }

        let note =
            notes.unwrap_or_else(|| format!("Status changed from {} to {}", order.status, target));
        sqlx::query(
            r#"
            INSERT INTO order_status_history (id, order_id, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(target)
        .bind(note)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Order {
            status: target,
            updated_at: now,
            ..order
        })
    }

    /// Append a history note without changing status
    ///
    /// Used for facts that need human follow-up (e.g. a chargeback opened at
    /// the gateway). The row repeats the current status so the latest-entry
    /// invariant keeps holding.
    pub async fn append_note(&self, order_id: &str, note: &str) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))?;

        sqlx::query(
            r#"
            INSERT INTO order_status_history (id, order_id, status, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(status)
        .bind(note)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Check that the order's status matches its most recent history entry
    ///
    /// A mismatch means a write path broke atomicity and is surfaced as a
    /// fatal integrity error.
    pub async fn verify_consistency(&self, order_id: &str) -> RepoResult<()> {
        let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", order_id)))?;

        let latest = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM order_status_history WHERE order_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match latest {
            Some(latest) if latest == status => Ok(()),
            Some(latest) => Err(RepoError::Inconsistent(format!(
                "Order {} status is {} but latest history entry is {}",
                order_id, status, latest
            ))),
            None => Err(RepoError::Inconsistent(format!(
                "Order {} has no history entries",
                order_id
            ))),
        }
    }
}
