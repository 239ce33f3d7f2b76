//! Order Ledger
//!
//! The only way an order comes into existence. The ledger snapshots the
//! buyer's cart, prices it, and hands the whole thing to the order
//! repository as one atomic checkout. After that, order rows are immutable
//! except for `status` and `updated_at`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

use crate::core::Config;
use crate::db::models::{CartItem, NewOrder, NewOrderItem, OrderDetail};
use crate::db::repository::{AddressRepository, CartRepository, OrderRepository, RepoError};
use crate::orders::coupon::CouponEvaluator;
use crate::orders::number::generate_order_number;
use shared::money::{round_money, to_decimal, to_f64};
use shared::{AppError, AppResult};

/// How many times checkout retries on an order-number collision
const NUMBER_RETRY_LIMIT: u32 = 3;

/// Checkout request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub delivery_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    #[validate(length(max = 64))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Computed checkout totals, all in major currency units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub delivery_fee: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
}

/// Order ledger service
pub struct OrderLedger {
    orders: OrderRepository,
    cart: CartRepository,
    addresses: AddressRepository,
    coupons: Arc<dyn CouponEvaluator>,
    config: Config,
}

impl OrderLedger {
    pub fn new(pool: SqlitePool, config: Config, coupons: Arc<dyn CouponEvaluator>) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            cart: CartRepository::new(pool.clone()),
            addresses: AddressRepository::new(pool),
            coupons,
            config,
        }
    }

    /// Convert the user's cart into a pending order
    ///
    /// Fails with `EmptyCart` when there is nothing to buy and with
    /// `InvalidAddress` when a supplied address id does not resolve to one
    /// owned by this user. Retries a few times when the generated order
    /// number collides with an existing one.
    pub async fn checkout(
        &self,
        user_id: &str,
        request: CheckoutRequest,
    ) -> AppResult<OrderDetail> {
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let lines = self.cart.line_items(user_id).await.map_err(AppError::from)?;
        if lines.is_empty() {
            return Err(AppError::empty_cart());
        }

        self.validate_address(request.delivery_address_id.as_deref(), user_id)
            .await?;
        self.validate_address(request.billing_address_id.as_deref(), user_id)
            .await?;

        let totals = self
            .compute_totals(&lines, request.coupon_code.as_deref(), user_id)
            .await?;

        let items: Vec<NewOrderItem> = lines.iter().map(line_to_item).collect();
        let expected_lines = lines.len() as u64;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let new_order = NewOrder {
                user_id: user_id.to_string(),
                order_number: generate_order_number(),
                delivery_address_id: request.delivery_address_id.clone(),
                billing_address_id: request.billing_address_id.clone(),
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                delivery_fee: totals.delivery_fee,
                discount_amount: totals.discount_amount,
                total_amount: totals.total_amount,
                notes: request.notes.clone(),
            };

            match self
                .orders
                .create_checkout(new_order, items.clone(), expected_lines)
                .await
            {
                Ok(detail) => {
                    info!(
                        order_id = %detail.order.id,
                        order_number = %detail.order.order_number,
                        total = detail.order.total_amount,
                        "Order created"
                    );
                    return Ok(detail);
                }
                Err(RepoError::Duplicate(msg)) if attempt < NUMBER_RETRY_LIMIT => {
                    warn!(attempt, "Order number collision, retrying: {}", msg);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Price a cart snapshot
    ///
    /// All arithmetic runs on `Decimal` and each component is rounded to two
    /// decimal places before the final sum, so the stored components always
    /// balance against the stored total.
    pub async fn compute_totals(
        &self,
        lines: &[CartItem],
        coupon_code: Option<&str>,
        user_id: &str,
    ) -> AppResult<OrderTotals> {
        let mut subtotal = Decimal::ZERO;
        for line in lines {
            subtotal += to_decimal(line.unit_price) * Decimal::from(line.quantity);
        }
        let subtotal = round_money(subtotal);

        let tax = round_money(subtotal * to_decimal(self.config.tax_rate));

        let delivery = if subtotal >= to_decimal(self.config.free_delivery_threshold) {
            Decimal::ZERO
        } else {
            round_money(to_decimal(self.config.delivery_fee))
        };

        let discount = round_money(to_decimal(
            self.coupons
                .apply_discount(to_f64(subtotal), coupon_code, user_id)
                .await?,
        ));
        if discount < Decimal::ZERO || discount > subtotal {
            return Err(AppError::validation(format!(
                "Discount {} out of range for subtotal {}",
                discount, subtotal
            )));
        }

        let total = subtotal + tax + delivery - discount;

        Ok(OrderTotals {
            subtotal: to_f64(subtotal),
            tax_amount: to_f64(tax),
            delivery_fee: to_f64(delivery),
            discount_amount: to_f64(discount),
            total_amount: to_f64(total),
        })
    }

    async fn validate_address(&self, address_id: Option<&str>, user_id: &str) -> AppResult<()> {
        let Some(address_id) = address_id else {
            return Ok(());
        };
        let resolved = self
            .addresses
            .resolve(address_id, user_id)
            .await
            .map_err(AppError::from)?;
        if resolved.is_none() {
            return Err(AppError::invalid_address(format!(
                "Address {} not found",
                address_id
            )));
        }
        Ok(())
    }
}

fn line_to_item(line: &CartItem) -> NewOrderItem {
    let total =
        round_money(to_decimal(line.unit_price) * Decimal::from(line.quantity));
    NewOrderItem {
        product_id: line.product_id.clone(),
        product_name: line.product_name.clone(),
        product_sku: line.product_sku.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        total_price: to_f64(total),
        product_image: line.product_image.clone(),
        product_weight: line.product_weight.clone(),
        product_unit: line.product_unit.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::coupon::NoCoupons;
    use chrono::Utc;

    fn cart_line(unit_price: f64, quantity: i64) -> CartItem {
        CartItem {
            id: "line".into(),
            user_id: "user-1".into(),
            product_id: "prod".into(),
            product_name: "Widget".into(),
            product_sku: "SKU-1".into(),
            unit_price,
            quantity,
            product_image: None,
            product_weight: None,
            product_unit: None,
            created_at: Utc::now(),
        }
    }

    fn test_ledger(pool: SqlitePool) -> OrderLedger {
        let config = Config::with_overrides(":memory:", 0);
        OrderLedger::new(pool, config, Arc::new(NoCoupons))
    }

    #[tokio::test]
    async fn totals_below_free_delivery_threshold() {
        let db = crate::db::DbService::new_in_memory().await.unwrap();
        let ledger = test_ledger(db.pool);

        let lines = vec![cart_line(10.00, 1), cart_line(7.50, 2)];
        let totals = ledger
            .compute_totals(&lines, None, "user-1")
            .await
            .unwrap();

        assert_eq!(totals.subtotal, 25.00);
        assert_eq!(totals.tax_amount, 2.00);
        assert_eq!(totals.delivery_fee, 5.99);
        assert_eq!(totals.discount_amount, 0.0);
        assert_eq!(totals.total_amount, 32.99);
    }

    #[tokio::test]
    async fn delivery_is_free_at_threshold() {
        let db = crate::db::DbService::new_in_memory().await.unwrap();
        let ledger = test_ledger(db.pool);

        let lines = vec![cart_line(25.00, 2)];
        let totals = ledger
            .compute_totals(&lines, None, "user-1")
            .await
            .unwrap();

        assert_eq!(totals.subtotal, 50.00);
        assert_eq!(totals.delivery_fee, 0.0);
        assert_eq!(totals.total_amount, 54.00);
    }

    #[tokio::test]
    async fn components_balance_after_rounding() {
        let db = crate::db::DbService::new_in_memory().await.unwrap();
        let ledger = test_ledger(db.pool);

        // 3 * 3.33 = 9.99; tax 0.7992 rounds to 0.80
        let lines = vec![cart_line(3.33, 3)];
        let totals = ledger
            .compute_totals(&lines, None, "user-1")
            .await
            .unwrap();

        assert_eq!(totals.tax_amount, 0.80);
        assert!(shared::money::totals_balance(
            totals.subtotal,
            totals.tax_amount,
            totals.delivery_fee,
            totals.discount_amount,
            totals.total_amount,
        ));
    }
}
