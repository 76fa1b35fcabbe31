//! Reconciles payment-processor webhooks into subscription state.
//!
//! Every event ID is recorded before it is applied, so a redelivered event
//! is acknowledged without being applied twice. If applying fails the record
//! is removed again and the processor's retry gets a fresh attempt.

use std::time::Duration;

use billing::webhook::{construct_event, CheckoutSessionObject, EventKind, StripeEvent, SubscriptionObject};
use billing::{find_plan, plan_key, BillingError, Interval, StripeConfig};
use database::{transaction, webhook_event, Database, NewTransaction, SubscriptionStatus, TransactionType};
use tracing::{error, info, warn};

use crate::credits::{PlanChange, SubscriptionManager};
use crate::error::Result;

/// Map a processor subscription status onto the local three-value status.
pub fn map_subscription_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" | "trialing" => SubscriptionStatus::Active,
        "canceled" => SubscriptionStatus::Cancelled,
        _ => SubscriptionStatus::Expired,
    }
}

/// What happened to a verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A dashboard test event; verified but not applied.
    TestEvent,
    /// Already handled earlier.
    Duplicate,
    /// State was changed.
    Applied,
    /// Recognised type that could not be applied; acknowledged anyway.
    Skipped(String),
    /// Event type this application does not handle.
    Ignored,
}

/// Verifies and applies processor webhooks.
#[derive(Debug, Clone)]
pub struct WebhookHandler {
    db: Database,
    subscriptions: SubscriptionManager,
    secret: String,
    tolerance: Duration,
}

impl WebhookHandler {
    pub fn new(db: Database, secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            subscriptions: SubscriptionManager::new(db.clone()),
            db,
            secret: secret.into(),
            tolerance,
        }
    }

    pub fn from_config(db: Database, config: &StripeConfig) -> Self {
        Self::new(db, config.webhook_secret.clone(), config.webhook_tolerance)
    }

    /// Verify `payload` against `signature` and apply the event.
    ///
    /// Signature failures and unparsable bodies return an error before any
    /// write. Everything else that verifies is acknowledged.
    pub async fn handle(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        let event = construct_event(payload, signature, &self.secret, self.tolerance)?;

        if event.is_test_event() {
            info!(event_id = %event.id, "Test webhook verified");
            return Ok(WebhookOutcome::TestEvent);
        }

        info!(event_id = %event.id, event_type = %event.event_type, "Webhook received");

        if !webhook_event::record_event(self.db.pool(), &event.id, &event.event_type).await? {
            info!(event_id = %event.id, "Duplicate webhook, already processed");
            return Ok(WebhookOutcome::Duplicate);
        }

        match self.dispatch(&event).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(event_id = %event.id, error = %e, "Webhook processing failed");
                if let Err(forget) = webhook_event::forget_event(self.db.pool(), &event.id).await {
                    error!(event_id = %event.id, error = %forget, "Could not release webhook event for retry");
                }
                Err(e)
            }
        }
    }

    async fn dispatch(&self, event: &StripeEvent) -> Result<WebhookOutcome> {
        // A signed event whose object does not decode is acknowledged, not
        // rejected: redelivering the same body cannot succeed.
        match event.kind() {
            EventKind::CheckoutSessionCompleted => match event.checkout_session() {
                Ok(session) => self.checkout_completed(&session).await,
                Err(e) => Ok(unusable(event, &e)),
            },
            EventKind::SubscriptionUpdated => match event.subscription() {
                Ok(object) => self.subscription_updated(&object).await,
                Err(e) => Ok(unusable(event, &e)),
            },
            EventKind::SubscriptionDeleted => match event.subscription() {
                Ok(object) => self.subscription_deleted(&object).await,
                Err(e) => Ok(unusable(event, &e)),
            },
            EventKind::Other(kind) => {
                info!(event_type = %kind, "Unhandled webhook type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn checkout_completed(&self, session: &CheckoutSessionObject) -> Result<WebhookOutcome> {
        let (Some(user_id), Some(plan_id), Some(interval)) = (
            session.user_id(),
            session.metadata_value("plan"),
            session.metadata_value("interval"),
        ) else {
            warn!(session_id = %session.id, "Checkout session is missing metadata");
            return Ok(skipped("missing checkout metadata"));
        };

        let Some(plan) = find_plan(plan_id) else {
            warn!(session_id = %session.id, plan = plan_id, "Checkout for unknown plan");
            return Ok(skipped("unknown plan"));
        };
        let Ok(interval) = interval.parse::<Interval>() else {
            warn!(session_id = %session.id, interval, "Checkout for unknown interval");
            return Ok(skipped("unknown interval"));
        };

        self.subscriptions
            .apply_plan_change(
                user_id,
                &PlanChange::Purchase {
                    plan: plan_key(plan.id, interval),
                    credits: plan.credits_for(interval),
                    stripe_customer_id: session.customer.clone(),
                    stripe_subscription_id: session.subscription.clone(),
                },
            )
            .await?;

        transaction::create_transaction(
            self.db.pool(),
            &NewTransaction {
                user_id,
                transaction_type: TransactionType::Purchase,
                amount: session.amount_total.unwrap_or(0),
                description: Some(plan.purchase_description(interval)),
                stripe_payment_intent_id: session.payment_intent.clone(),
            },
        )
        .await?;

        info!(user_id, plan = plan.id, %interval, "Subscription purchased");
        Ok(WebhookOutcome::Applied)
    }

    async fn subscription_updated(&self, object: &SubscriptionObject) -> Result<WebhookOutcome> {
        let Some(user_id) = self.resolve_user(object).await? else {
            return Ok(skipped("subscription has no known user"));
        };

        let status = map_subscription_status(&object.status);
        self.subscriptions
            .apply_plan_change(
                user_id,
                &PlanChange::Status {
                    status,
                    stripe_subscription_id: object.id.clone(),
                },
            )
            .await?;

        info!(user_id, processor_status = %object.status, "Subscription status updated");
        Ok(WebhookOutcome::Applied)
    }

    async fn subscription_deleted(&self, object: &SubscriptionObject) -> Result<WebhookOutcome> {
        let Some(user_id) = self.resolve_user(object).await? else {
            return Ok(skipped("subscription has no known user"));
        };

        self.subscriptions
            .apply_plan_change(user_id, &PlanChange::Cancellation)
            .await?;

        info!(user_id, "Subscription cancelled, reverted to free plan");
        Ok(WebhookOutcome::Applied)
    }

    /// Metadata first, then the stored processor subscription ID.
    async fn resolve_user(&self, object: &SubscriptionObject) -> Result<Option<i64>> {
        if let Some(user_id) = object.user_id() {
            return Ok(Some(user_id));
        }

        let owner = self.subscriptions.find_by_stripe_subscription(&object.id).await?;
        if owner.is_none() {
            warn!(subscription_id = %object.id, "No user for processor subscription");
        }
        Ok(owner.map(|s| s.user_id))
    }
}

fn skipped(reason: &str) -> WebhookOutcome {
    WebhookOutcome::Skipped(reason.to_string())
}

fn unusable(event: &StripeEvent, error: &BillingError) -> WebhookOutcome {
    warn!(event_id = %event.id, event_type = %event.event_type, %error, "Unusable webhook object");
    skipped("unusable event object")
}
