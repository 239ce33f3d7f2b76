//! Shared test harness: in-memory database, fixed config, mock gateway.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::SqlitePool;

use storefront_server::db::models::OrderDetail;
use storefront_server::db::repository::CartRepository;
use storefront_server::db::DbService;
use storefront_server::orders::coupon::NoCoupons;
use storefront_server::orders::ledger::CheckoutRequest;
use storefront_server::orders::OrderLedger;
use storefront_server::payments::gateway::{
    GatewayError, IntentStatus, PaymentGateway, PaymentIntent, Refund, RefundStatus,
};
use storefront_server::{Config, CurrentUser};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Deterministic config, independent of the test host's environment
pub fn test_config() -> Config {
    Config {
        database_path: ":memory:".into(),
        http_port: 0,
        environment: "test".into(),
        tax_rate: 0.08,
        delivery_fee: 5.99,
        free_delivery_threshold: 50.0,
        currency: "usd".into(),
        stripe_secret_key: "sk_test_key".into(),
        stripe_webhook_secret: WEBHOOK_SECRET.into(),
        gateway_timeout_ms: 1_000,
        webhook_tolerance_secs: 300,
    }
}

pub async fn test_pool() -> SqlitePool {
    DbService::new_in_memory()
        .await
        .expect("in-memory database")
        .pool
}

pub fn buyer() -> CurrentUser {
    CurrentUser {
        id: "user-1".into(),
        is_admin: false,
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser {
        id: "admin-1".into(),
        is_admin: true,
    }
}

/// In-memory gateway double
///
/// Intents start in `RequiresPaymentMethod`; tests flip them to the state
/// under test with [`MockGateway::set_status`].
#[derive(Default)]
pub struct MockGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, intent_id: &str, status: IntentStatus) {
        let mut intents = self.intents.lock().unwrap();
        intents
            .get_mut(intent_id)
            .expect("intent exists")
            .status = status;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let intent = PaymentIntent {
            id: format!("pi_test_{n}"),
            client_secret: Some(format!("pi_test_{n}_secret")),
            status: IntentStatus::RequiresPaymentMethod,
            amount: amount_minor,
            currency: currency.to_string(),
            metadata: metadata.clone(),
        };
        self.intents
            .lock()
            .unwrap()
            .insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, GatewayError> {
        self.intents
            .lock()
            .unwrap()
            .get(intent_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api(format!("no such intent: {intent_id}")))
    }

    async fn create_refund(
        &self,
        intent_id: &str,
        amount_minor: Option<i64>,
    ) -> Result<Refund, GatewayError> {
        let amount = self.retrieve_intent(intent_id).await?.amount;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Refund {
            id: format!("re_test_{n}"),
            status: RefundStatus::Succeeded,
            amount: amount_minor.unwrap_or(amount),
        })
    }
}

/// Fill a user's cart with `(unit_price, quantity)` lines
pub async fn seed_cart(pool: &SqlitePool, user_id: &str, lines: &[(f64, i64)]) {
    let cart = CartRepository::new(pool.clone());
    for (i, (price, qty)) in lines.iter().enumerate() {
        cart.add_line(
            user_id,
            &format!("prod-{i}"),
            &format!("Product {i}"),
            &format!("SKU-{i}"),
            *price,
            *qty,
        )
        .await
        .expect("seed cart line");
    }
}

pub fn empty_checkout() -> CheckoutRequest {
    CheckoutRequest {
        delivery_address_id: None,
        billing_address_id: None,
        coupon_code: None,
        notes: None,
    }
}

/// Seed a cart and check it out as `user_id`
pub async fn place_order(pool: &SqlitePool, user_id: &str, lines: &[(f64, i64)]) -> OrderDetail {
    seed_cart(pool, user_id, lines).await;
    let ledger = OrderLedger::new(pool.clone(), test_config(), Arc::new(NoCoupons));
    ledger
        .checkout(user_id, empty_checkout())
        .await
        .expect("checkout")
}
