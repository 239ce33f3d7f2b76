//! Payment Orchestrator
//!
//! Binds payment intents to orders. Every intent carries the order id in its
//! metadata, and every settlement path (client confirmation, webhook, refund)
//! checks that correlation before touching the order state machine. The
//! order's stored total is the only amount ever sent to the gateway.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::models::Order;
use crate::db::repository::OrderRepository;
use crate::payments::gateway::{IntentStatus, PaymentGateway, PaymentIntent, Refund};
use shared::money::to_minor_units;
use shared::order::{transition, OrderEvent, OrderStatus};
use shared::{AppError, AppResult};

/// Result of a client-side confirmation attempt
///
/// `confirmed` is false when the gateway has not (yet) seen the payment
/// succeed; the order is untouched in that case and the caller may retry.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmOutcome {
    pub confirmed: bool,
    pub intent_status: IntentStatus,
    pub order: Order,
}

pub struct PaymentOrchestrator {
    orders: OrderRepository,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn PaymentGateway>, currency: &str) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            gateway,
            currency: currency.to_string(),
        }
    }

    /// Create a payment intent for a pending order
    ///
    /// The amount is taken from the stored order total, never from the
    /// request. Any order no longer pending refuses an intent.
    pub async fn create_intent_for_order(
        &self,
        order_id: &str,
        user: &CurrentUser,
    ) -> AppResult<PaymentIntent> {
        let order = self.load_owned(order_id, user).await?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::already_settled(order.order_number.clone()));
        }

        let amount_minor = to_minor_units(order.total_amount);
        let metadata = HashMap::from([
            ("order_id".to_string(), order.id.clone()),
            ("order_number".to_string(), order.order_number.clone()),
            ("user_id".to_string(), order.user_id.clone()),
        ]);

        let intent = self
            .gateway
            .create_intent(amount_minor, &self.currency, &metadata)
            .await?;

        info!(
            order_id = %order.id,
            intent_id = %intent.id,
            amount_minor,
            "Payment intent created"
        );
        Ok(intent)
    }

    /// Confirm payment from the client-side flow
    ///
    /// The browser reports success first; the webhook usually arrives later
    /// and becomes a no-op. The gateway is always re-queried so a forged
    /// client report cannot confirm an unpaid order. A not-yet-succeeded
    /// intent is reported back without mutating the order, and confirming an
    /// already confirmed order is idempotent.
    pub async fn confirm_client_side(
        &self,
        order_id: &str,
        intent_id: &str,
        user: &CurrentUser,
    ) -> AppResult<ConfirmOutcome> {
        let order = self.load_owned(order_id, user).await?;

        let intent = self.gateway.retrieve_intent(intent_id).await?;
        self.check_correlation(&order, &intent)?;

        if intent.status != IntentStatus::Succeeded {
            return Ok(ConfirmOutcome {
                confirmed: false,
                intent_status: intent.status,
                order,
            });
        }

        if order.status == OrderStatus::Confirmed {
            return Ok(ConfirmOutcome {
                confirmed: true,
                intent_status: intent.status,
                order,
            });
        }

        let updated = self
            .orders
            .apply_transition(
                &order.id,
                OrderEvent::PaymentSucceeded,
                Some(format!("Payment confirmed (intent {})", intent_id)),
            )
            .await?;

        info!(order_id = %order.id, intent_id, "Order confirmed by client");
        Ok(ConfirmOutcome {
            confirmed: true,
            intent_status: intent.status,
            order: updated,
        })
    }

    /// Refund a settled order (admin only)
    ///
    /// The transition is checked before money moves, so an order that cannot
    /// become `refunded` never reaches the gateway. `amount_minor` of `None`
    /// refunds the full charge.
    pub async fn refund(
        &self,
        order_id: &str,
        intent_id: &str,
        amount_minor: Option<i64>,
        user: &CurrentUser,
    ) -> AppResult<(Order, Refund)> {
        user.require_admin()?;

        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        transition(order.status, OrderEvent::RefundIssued).map_err(|e| {
            AppError::invalid_transition(e.to_string())
        })?;

        let intent = self.gateway.retrieve_intent(intent_id).await?;
        self.check_correlation(&order, &intent)?;

        let refund = self.gateway.create_refund(intent_id, amount_minor).await?;

        let updated = self
            .orders
            .apply_transition(
                &order.id,
                OrderEvent::RefundIssued,
                Some(format!("Refund issued: {}", refund.id)),
            )
            .await?;

        info!(order_id = %order.id, refund_id = %refund.id, "Order refunded");
        Ok((updated, refund))
    }

    async fn load_owned(&self, order_id: &str, user: &CurrentUser) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        user.require_owner(&order.user_id)?;
        Ok(order)
    }

    fn check_correlation(&self, order: &Order, intent: &PaymentIntent) -> AppResult<()> {
        match intent.metadata.get("order_id") {
            Some(id) if id == &order.id => Ok(()),
            _ => Err(AppError::intent_mismatch(format!(
                "Intent {} does not belong to order {}",
                intent.id, order.order_number
            ))),
        }
    }
}
