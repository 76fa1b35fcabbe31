//! Checkout creation and webhook reconciliation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use billing::{BillingError, CheckoutSession, CheckoutSessionParams, Interval, PaymentProcessor};
use database::{transaction, user, webhook_event, Database, SubscriptionStatus, TransactionType, User, UserUpsert};
use flerte::{CheckoutService, FlerteError, SubscriptionManager, WebhookHandler, WebhookOutcome};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

const SECRET: &str = "whsec_flerte_test";

/// Records every checkout request instead of calling Stripe.
#[derive(Default)]
struct FakeProcessor {
    calls: Mutex<Vec<CheckoutSessionParams>>,
    fail_with: Option<String>,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> billing::Result<CheckoutSession> {
        self.calls.lock().unwrap().push(params.clone());
        if let Some(message) = &self.fail_with {
            return Err(BillingError::Processor {
                status: 400,
                message: message.clone(),
            });
        }
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: Some("https://checkout.stripe.com/c/pay/cs_test_1".to_string()),
        })
    }
}

async fn setup() -> (Database, User) {
    let db = Database::in_memory().await.unwrap();
    let user = user::upsert_user(
        db.pool(),
        &UserUpsert {
            open_id: "billing-user".to_string(),
            name: Some("Rafa".to_string()),
            email: Some("rafa@example.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    (db, user)
}

fn sign(payload: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn handler(db: &Database) -> WebhookHandler {
    WebhookHandler::new(db.clone(), SECRET, Duration::from_secs(300))
}

fn checkout_completed(event_id: &str, user_id: i64, plan: &str, interval: &str) -> String {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "amount_total": 2990,
            "payment_intent": "pi_1",
            "metadata": {
                "user_id": user_id.to_string(),
                "plan": plan,
                "interval": interval
            }
        }}
    })
    .to_string()
}

fn subscription_event(event_id: &str, kind: &str, status: &str, metadata: serde_json::Value) -> String {
    json!({
        "id": event_id,
        "type": kind,
        "data": {"object": {
            "id": "sub_1",
            "status": status,
            "customer": "cus_1",
            "metadata": metadata
        }}
    })
    .to_string()
}

async fn deliver(handler: &WebhookHandler, payload: &str) -> flerte::Result<WebhookOutcome> {
    handler.handle(payload.as_bytes(), &sign(payload)).await
}

#[tokio::test]
async fn test_checkout_sends_plan_metadata() {
    let (_db, user) = setup().await;
    let processor = Arc::new(FakeProcessor::default());
    let service = CheckoutService::new(processor.clone());

    let url = service
        .create_checkout_session(&user, "pro", Interval::Weekly, "https://flerte.example")
        .await
        .unwrap();
    assert_eq!(url, "https://checkout.stripe.com/c/pay/cs_test_1");

    let calls = processor.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].user_id, user.id);
    assert_eq!(calls[0].price_id, "price_1SUDL5GYEWk0KjWQPBVgRk5A");
    assert_eq!(calls[0].customer_email.as_deref(), Some("rafa@example.com"));
    assert_eq!(calls[0].plan, "pro");
    assert_eq!(calls[0].interval, Interval::Weekly);
}

#[tokio::test]
async fn test_invalid_plan_makes_no_external_call() {
    let (_db, user) = setup().await;
    let processor = Arc::new(FakeProcessor::default());
    let service = CheckoutService::new(processor.clone());

    for plan in ["enterprise", "free"] {
        let result = service
            .create_checkout_session(&user, plan, Interval::Monthly, "http://localhost:3000")
            .await;
        assert!(matches!(result, Err(FlerteError::InvalidPlan(_))), "{plan}");
    }
    assert!(processor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_processor_failure_is_surfaced() {
    let (_db, user) = setup().await;
    let processor = Arc::new(FakeProcessor {
        fail_with: Some("No such price".to_string()),
        ..Default::default()
    });
    let service = CheckoutService::new(processor);

    let err = service
        .create_checkout_session(&user, "premium", Interval::Monthly, "http://localhost:3000")
        .await
        .unwrap_err();
    assert!(matches!(err, FlerteError::Payment(_)));
    assert!(err.to_string().contains("No such price"));
}

#[tokio::test]
async fn test_checkout_completed_applies_monthly_plan() {
    let (db, user) = setup().await;
    let handler = handler(&db);

    let outcome = deliver(&handler, &checkout_completed("evt_1", user.id, "pro", "monthly"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let sub = SubscriptionManager::new(db.clone()).get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "pro_monthly");
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!((sub.credits_remaining, sub.credits_total), (200, 200));
    assert_eq!(sub.stripe_customer_id.as_deref(), Some("cus_1"));
    assert_eq!(sub.stripe_subscription_id.as_deref(), Some("sub_1"));

    let ledger = transaction::list_transactions(db.pool(), user.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].transaction_type, TransactionType::Purchase);
    assert_eq!(ledger[0].amount, 2990);
    assert_eq!(ledger[0].description.as_deref(), Some("Assinatura Pro - Mensal"));
    assert_eq!(ledger[0].stripe_payment_intent_id.as_deref(), Some("pi_1"));
}

#[tokio::test]
async fn test_weekly_and_unlimited_grants() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let manager = SubscriptionManager::new(db.clone());

    deliver(&handler, &checkout_completed("evt_w", user.id, "pro", "weekly"))
        .await
        .unwrap();
    let sub = manager.get_or_create(user.id).await.unwrap();
    assert_eq!((sub.plan.as_str(), sub.credits_total), ("pro_weekly", 50));

    deliver(&handler, &checkout_completed("evt_p", user.id, "premium", "weekly"))
        .await
        .unwrap();
    let sub = manager.get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "premium_weekly");
    assert_eq!((sub.credits_remaining, sub.credits_total), (50, 50));
    assert!(!sub.is_unlimited());

    deliver(&handler, &checkout_completed("evt_pm", user.id, "premium", "monthly"))
        .await
        .unwrap();
    let sub = manager.get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "premium_monthly");
    assert!(sub.is_unlimited());
    assert_eq!(sub.credits_remaining, -1);
}

#[tokio::test]
async fn test_duplicate_delivery_applies_once() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let payload = checkout_completed("evt_dup", user.id, "pro", "monthly");

    assert_eq!(deliver(&handler, &payload).await.unwrap(), WebhookOutcome::Applied);
    assert_eq!(deliver(&handler, &payload).await.unwrap(), WebhookOutcome::Duplicate);

    let ledger = transaction::list_transactions(db.pool(), user.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_bad_signature_changes_nothing() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let payload = checkout_completed("evt_forged", user.id, "premium", "monthly");

    let forged = format!("t={},v1={}", chrono::Utc::now().timestamp(), "00".repeat(32));
    let result = handler.handle(payload.as_bytes(), &forged).await;
    assert!(matches!(result, Err(FlerteError::WebhookSignature(_))));

    let result = handler.handle(payload.as_bytes(), "").await;
    assert!(matches!(result, Err(FlerteError::WebhookSignature(_))));

    let sub = SubscriptionManager::new(db.clone()).get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "free");
    assert!(webhook_event::get_event(db.pool(), "evt_forged").await.unwrap().is_none());
}

#[tokio::test]
async fn test_test_events_are_only_verified() {
    let (db, user) = setup().await;
    let handler = handler(&db);

    let outcome = deliver(&handler, &checkout_completed("evt_test_abc", user.id, "pro", "monthly"))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::TestEvent);

    let sub = SubscriptionManager::new(db.clone()).get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "free");
    assert!(webhook_event::get_event(db.pool(), "evt_test_abc").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_metadata_is_skipped() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let payload = json!({
        "id": "evt_nometa",
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_2", "metadata": {}}}
    })
    .to_string();

    let outcome = deliver(&handler, &payload).await.unwrap();
    assert!(matches!(outcome, WebhookOutcome::Skipped(_)));

    let outcome = deliver(&handler, &checkout_completed("evt_gold", user.id, "gold", "monthly"))
        .await
        .unwrap();
    assert!(matches!(outcome, WebhookOutcome::Skipped(_)));

    assert!(transaction::list_transactions(db.pool(), user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_object_is_acknowledged() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let manager = SubscriptionManager::new(db.clone());

    // Numeric user_id where the metadata map holds strings.
    let checkout = json!({
        "id": "evt_numeric_meta",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_3",
            "metadata": {"user_id": user.id, "plan": "pro", "interval": "monthly"}
        }}
    })
    .to_string();
    let outcome = deliver(&handler, &checkout).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Skipped("unusable event object".to_string()));

    let deleted = json!({
        "id": "evt_bad_sub",
        "type": "customer.subscription.deleted",
        "data": {"object": {"id": 5}}
    })
    .to_string();
    let outcome = deliver(&handler, &deleted).await.unwrap();
    assert!(matches!(outcome, WebhookOutcome::Skipped(_)));

    // Acknowledged once; a redelivery is a duplicate, not a retry.
    assert_eq!(deliver(&handler, &checkout).await.unwrap(), WebhookOutcome::Duplicate);

    let sub = manager.get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "free");
    assert!(transaction::list_transactions(db.pool(), user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscription_updated_maps_status() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    let manager = SubscriptionManager::new(db.clone());
    deliver(&handler, &checkout_completed("evt_buy", user.id, "pro", "monthly"))
        .await
        .unwrap();

    let payload = subscription_event(
        "evt_upd",
        "customer.subscription.updated",
        "past_due",
        json!({"user_id": user.id.to_string()}),
    );
    assert_eq!(deliver(&handler, &payload).await.unwrap(), WebhookOutcome::Applied);

    let sub = manager.get_or_create(user.id).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Expired);
    assert_eq!(sub.plan, "pro_monthly");
    assert_eq!(sub.credits_remaining, 200);
}

#[tokio::test]
async fn test_subscription_user_falls_back_to_stored_id() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    deliver(&handler, &checkout_completed("evt_buy", user.id, "pro", "monthly"))
        .await
        .unwrap();

    let payload = subscription_event("evt_upd", "customer.subscription.updated", "canceled", json!(null));
    assert_eq!(deliver(&handler, &payload).await.unwrap(), WebhookOutcome::Applied);

    let sub = SubscriptionManager::new(db).get_or_create(user.id).await.unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Cancelled);
}

#[tokio::test]
async fn test_unknown_subscription_is_skipped() {
    let (db, _user) = setup().await;
    let handler = handler(&db);

    let payload = subscription_event("evt_orphan", "customer.subscription.deleted", "canceled", json!({}));
    assert!(matches!(
        deliver(&handler, &payload).await.unwrap(),
        WebhookOutcome::Skipped(_)
    ));
}

#[tokio::test]
async fn test_subscription_deleted_reverts_to_free() {
    let (db, user) = setup().await;
    let handler = handler(&db);
    deliver(&handler, &checkout_completed("evt_buy", user.id, "premium", "monthly"))
        .await
        .unwrap();

    let payload = subscription_event(
        "evt_del",
        "customer.subscription.deleted",
        "canceled",
        json!({"user_id": user.id.to_string()}),
    );
    deliver(&handler, &payload).await.unwrap();

    let sub = SubscriptionManager::new(db).get_or_create(user.id).await.unwrap();
    assert_eq!(sub.plan, "free");
    assert_eq!(sub.status, SubscriptionStatus::Cancelled);
    assert_eq!((sub.credits_remaining, sub.credits_total), (0, 10));
    assert!(sub.stripe_subscription_id.is_none());
}

#[tokio::test]
async fn test_unhandled_type_is_acknowledged() {
    let (db, _user) = setup().await;
    let handler = handler(&db);
    let payload = r#"{"id":"evt_inv","type":"invoice.paid","data":{"object":{}}}"#;

    assert_eq!(deliver(&handler, payload).await.unwrap(), WebhookOutcome::Ignored);
}

#[tokio::test]
async fn test_failed_processing_can_be_retried() {
    let (db, _user) = setup().await;
    let handler = handler(&db);
    // No such user: the foreign key rejects the subscription row.
    let payload = checkout_completed("evt_retry", 4242, "pro", "monthly");

    let result = deliver(&handler, &payload).await;
    assert!(matches!(result, Err(FlerteError::Database(_))));
    assert!(webhook_event::get_event(db.pool(), "evt_retry").await.unwrap().is_none());

    // The redelivery is attempted again rather than treated as a duplicate.
    let result = deliver(&handler, &payload).await;
    assert!(matches!(result, Err(FlerteError::Database(_))));
}
