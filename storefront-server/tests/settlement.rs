//! Settlement tests: intent lifecycle, webhook reconciliation, refunds.

mod common;

use common::{admin, buyer, place_order, test_pool, MockGateway, WEBHOOK_SECRET};
use shared::{ErrorCode, OrderStatus};
use storefront_server::db::repository::OrderRepository;
use storefront_server::payments::gateway::IntentStatus;
use storefront_server::payments::signature;
use storefront_server::payments::{PaymentOrchestrator, WebhookReconciler};

fn orchestrator(
    pool: &sqlx::SqlitePool,
    gateway: &std::sync::Arc<MockGateway>,
) -> PaymentOrchestrator {
    PaymentOrchestrator::new(pool.clone(), gateway.clone(), "usd")
}

fn reconciler(pool: &sqlx::SqlitePool) -> WebhookReconciler {
    WebhookReconciler::new(pool.clone(), WEBHOOK_SECRET, 300)
}

fn signed_event(event_type: &str, object_id: &str, order_id: &str) -> (Vec<u8>, String) {
    let payload = serde_json::json!({
        "id": "evt_test_1",
        "type": event_type,
        "data": { "object": { "id": object_id, "metadata": { "order_id": order_id } } },
    })
    .to_string()
    .into_bytes();
    let header = signature::sign(&payload, WEBHOOK_SECRET, chrono::Utc::now().timestamp());
    (payload, header)
}

// ==================== Intent creation ====================

#[tokio::test]
async fn intent_carries_order_total_and_correlation() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1), (7.50, 2)]).await;

    let intent = orchestrator(&pool, &gateway)
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();

    // 32.99 in cents, from the stored total
    assert_eq!(intent.amount, 3299);
    assert_eq!(intent.currency, "usd");
    assert_eq!(intent.metadata["order_id"], detail.order.id);
    assert_eq!(intent.metadata["order_number"], detail.order.order_number);
    assert_eq!(intent.metadata["user_id"], "user-1");
    assert!(intent.client_secret.is_some());
}

#[tokio::test]
async fn intent_requires_ownership() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let stranger = storefront_server::CurrentUser {
        id: "user-2".into(),
        is_admin: false,
    };
    let err = orchestrator(&pool, &gateway)
        .create_intent_for_order(&detail.order.id, &stranger)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn settled_order_refuses_second_intent() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();
    gateway.set_status(&intent.id, IntentStatus::Succeeded);
    orch.confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();

    let err = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadySettled);
}

#[tokio::test]
async fn cancelled_order_refuses_intent_as_settled() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let repo = OrderRepository::new(pool.clone());
    repo.apply_transition(&detail.order.id, shared::OrderEvent::Cancel, None)
        .await
        .unwrap();

    let err = orchestrator(&pool, &gateway)
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadySettled);
}

// ==================== Client-side confirmation ====================

#[tokio::test]
async fn confirm_happy_path_is_idempotent() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();
    gateway.set_status(&intent.id, IntentStatus::Succeeded);

    let outcome = orch
        .confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();
    assert!(outcome.confirmed);
    assert_eq!(outcome.order.status, OrderStatus::Confirmed);

    let repo = OrderRepository::new(pool.clone());
    let history = repo.history(&detail.order.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].status, OrderStatus::Confirmed);

    // Confirming again changes nothing
    let again = orch
        .confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();
    assert!(again.confirmed);
    assert_eq!(again.order.status, OrderStatus::Confirmed);
    assert_eq!(repo.history(&detail.order.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn confirm_reports_unpaid_intent_without_mutating() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();

    // Still RequiresPaymentMethod at the gateway
    let outcome = orch
        .confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();
    assert!(!outcome.confirmed);
    assert_eq!(outcome.intent_status, IntentStatus::RequiresPaymentMethod);

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(repo.history(&detail.order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn confirm_rejects_intent_for_another_order() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let first = place_order(&pool, "user-1", &[(10.00, 1)]).await;
    let second = place_order(&pool, "user-1", &[(20.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&first.order.id, &buyer())
        .await
        .unwrap();
    gateway.set_status(&intent.id, IntentStatus::Succeeded);

    let err = orch
        .confirm_client_side(&second.order.id, &intent.id, &buyer())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::IntentMismatch);
}

// ==================== Webhook reconciliation ====================

#[tokio::test]
async fn webhook_succeeded_confirms_order() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, header) =
        signed_event("payment_intent.succeeded", "pi_wh_1", &detail.order.id);
    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert_eq!(ack.outcome, "applied");

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    repo.verify_consistency(&detail.order.id).await.unwrap();
}

#[tokio::test]
async fn webhook_failure_cancels_pending_order() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, header) =
        signed_event("payment_intent.payment_failed", "pi_wh_2", &detail.order.id);
    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert_eq!(ack.outcome, "applied");

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn late_failure_webhook_after_confirmation_is_noop() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();
    gateway.set_status(&intent.id, IntentStatus::Succeeded);
    orch.confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();

    // The stale failure must be acknowledged but not applied
    let (payload, header) =
        signed_event("payment_intent.payment_failed", &intent.id, &detail.order.id);
    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert!(ack.outcome.starts_with("ignored"));

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(repo.history(&detail.order.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_success_webhook_is_noop() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, header) =
        signed_event("payment_intent.succeeded", "pi_wh_3", &detail.order.id);
    let rec = reconciler(&pool);
    rec.handle(&payload, Some(&header)).await.unwrap();
    let ack = rec.handle(&payload, Some(&header)).await.unwrap();
    assert!(ack.outcome.starts_with("ignored"));

    let repo = OrderRepository::new(pool);
    assert_eq!(repo.history(&detail.order.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn webhook_rejects_bad_signature() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, _) = signed_event("payment_intent.succeeded", "pi_wh_4", &detail.order.id);
    let forged = signature::sign(&payload, "whsec_wrong", chrono::Utc::now().timestamp());

    let err = reconciler(&pool)
        .handle(&payload, Some(&forged))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SignatureInvalid);

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn unconfigured_secret_rejects_all_deliveries() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    // A reconciler without a signing secret must not accept anything,
    // signed or not; a forged success would otherwise confirm the order.
    let rec = WebhookReconciler::new(pool.clone(), "", 300);
    let (payload, header) =
        signed_event("payment_intent.succeeded", "pi_wh_7", &detail.order.id);

    let err = rec.handle(&payload, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);
    let err = rec.handle(&payload, Some(&header)).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(repo.history(&detail.order.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn webhook_rejects_missing_signature() {
    let pool = test_pool().await;
    let (payload, _) = signed_event("payment_intent.succeeded", "pi_wh_5", "order-x");

    let err = reconciler(&pool).handle(&payload, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SignatureInvalid);
}

#[tokio::test]
async fn webhook_for_unknown_order_is_acknowledged() {
    let pool = test_pool().await;
    let (payload, header) = signed_event("payment_intent.succeeded", "pi_wh_6", "no-such-order");

    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert_eq!(ack.outcome, "ignored: unknown order");
}

#[tokio::test]
async fn unhandled_event_type_is_acknowledged() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, header) = signed_event("customer.created", "cus_1", &detail.order.id);
    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert_eq!(ack.outcome, "ignored: unhandled event type");
}

#[tokio::test]
async fn dispute_appends_note_without_transition() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let (payload, header) =
        signed_event("charge.dispute.created", "dp_test_1", &detail.order.id);
    let ack = reconciler(&pool)
        .handle(&payload, Some(&header))
        .await
        .unwrap();
    assert_eq!(ack.outcome, "applied: dispute noted");

    let repo = OrderRepository::new(pool);
    let order = repo.find_by_id(&detail.order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let history = repo.history(&detail.order.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].status, OrderStatus::Pending);
    assert!(history[1]
        .notes
        .as_deref()
        .unwrap()
        .contains("dp_test_1"));
    repo.verify_consistency(&detail.order.id).await.unwrap();
}

// ==================== Refunds ====================

#[tokio::test]
async fn refund_flow_records_refund_id() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let orch = orchestrator(&pool, &gateway);
    let intent = orch
        .create_intent_for_order(&detail.order.id, &buyer())
        .await
        .unwrap();
    gateway.set_status(&intent.id, IntentStatus::Succeeded);
    orch.confirm_client_side(&detail.order.id, &intent.id, &buyer())
        .await
        .unwrap();

    let (order, refund) = orch
        .refund(&detail.order.id, &intent.id, None, &admin())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Refunded);
    assert_eq!(refund.amount, intent.amount);

    let repo = OrderRepository::new(pool);
    let history = repo.history(&detail.order.id).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.status, OrderStatus::Refunded);
    assert!(last.notes.as_deref().unwrap().contains(&refund.id));
}

#[tokio::test]
async fn refund_requires_admin() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let err = orchestrator(&pool, &gateway)
        .refund(&detail.order.id, "pi_any", None, &buyer())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AdminRequired);
}

#[tokio::test]
async fn refund_rejected_before_settlement() {
    let pool = test_pool().await;
    let gateway = MockGateway::new();
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let err = orchestrator(&pool, &gateway)
        .refund(&detail.order.id, "pi_any", None, &admin())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

// ==================== Concurrency ====================

#[tokio::test]
async fn concurrent_transitions_have_a_single_winner() {
    let pool = test_pool().await;
    let detail = place_order(&pool, "user-1", &[(10.00, 1)]).await;

    let repo = OrderRepository::new(pool.clone());
    let attempts = (0..2).map(|_| {
        let repo = repo.clone();
        let id = detail.order.id.clone();
        async move {
            repo.apply_transition(&id, shared::OrderEvent::PaymentSucceeded, None)
                .await
        }
    });
    let results = futures::future::join_all(attempts).await;

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);

    let history = repo.history(&detail.order.id).await.unwrap();
    assert_eq!(history.len(), 2);
    repo.verify_consistency(&detail.order.id).await.unwrap();
}
