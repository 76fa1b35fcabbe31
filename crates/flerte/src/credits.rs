//! Subscription and credit accounting.

use database::models::{FREE_CREDITS, FREE_PLAN};
use database::{subscription, Database, DatabaseError, Subscription, SubscriptionStatus, SubscriptionUpdate};
use tracing::{debug, info};

use crate::error::Result;

/// A billing-driven change to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanChange {
    /// A completed checkout: new plan key and a fresh credit grant.
    Purchase {
        plan: String,
        credits: i64,
        stripe_customer_id: Option<String>,
        stripe_subscription_id: Option<String>,
    },
    /// The processor changed the subscription's status.
    Status {
        status: SubscriptionStatus,
        stripe_subscription_id: String,
    },
    /// The processor subscription ended; fall back to the free plan, empty.
    Cancellation,
}

impl PlanChange {
    fn to_update(&self) -> SubscriptionUpdate {
        match self {
            PlanChange::Purchase {
                plan,
                credits,
                stripe_customer_id,
                stripe_subscription_id,
            } => SubscriptionUpdate {
                plan: Some(plan.clone()),
                status: Some(SubscriptionStatus::Active),
                credits_remaining: Some(*credits),
                credits_total: Some(*credits),
                end_date: Some(None),
                stripe_customer_id: stripe_customer_id.clone().map(Some),
                stripe_subscription_id: stripe_subscription_id.clone().map(Some),
            },
            PlanChange::Status {
                status,
                stripe_subscription_id,
            } => SubscriptionUpdate {
                status: Some(*status),
                stripe_subscription_id: Some(Some(stripe_subscription_id.clone())),
                ..Default::default()
            },
            PlanChange::Cancellation => SubscriptionUpdate {
                plan: Some(FREE_PLAN.to_string()),
                status: Some(SubscriptionStatus::Cancelled),
                credits_remaining: Some(0),
                credits_total: Some(FREE_CREDITS),
                stripe_subscription_id: Some(None),
                ..Default::default()
            },
        }
    }
}

/// Owns every subscription and balance mutation.
#[derive(Debug, Clone)]
pub struct SubscriptionManager {
    db: Database,
}

impl SubscriptionManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Return the user's subscription, creating the free default if absent.
    pub async fn get_or_create(&self, user_id: i64) -> Result<Subscription> {
        if let Some(existing) = subscription::get_subscription(self.db.pool(), user_id).await? {
            return Ok(existing);
        }

        if subscription::insert_default(self.db.pool(), user_id).await? {
            info!(user_id, "Created free subscription");
        }

        let created = subscription::get_subscription(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "Subscription",
                id: user_id.to_string(),
            })?;
        Ok(created)
    }

    /// Consume one credit. `false` means the balance was already zero.
    pub async fn deduct(&self, user_id: i64) -> Result<bool> {
        let deducted = subscription::deduct_credit(self.db.pool(), user_id).await?;
        debug!(user_id, deducted, "Credit deduction");
        Ok(deducted)
    }

    /// Apply a billing event to the user's subscription.
    pub async fn apply_plan_change(&self, user_id: i64, change: &PlanChange) -> Result<Subscription> {
        subscription::insert_default(self.db.pool(), user_id).await?;
        let updated =
            subscription::update_subscription(self.db.pool(), user_id, &change.to_update()).await?;

        info!(
            user_id,
            plan = %updated.plan,
            status = updated.status.as_str(),
            credits_total = updated.credits_total,
            "Subscription changed"
        );
        Ok(updated)
    }

    /// Apply a caller-supplied patch.
    pub async fn update(&self, user_id: i64, patch: &SubscriptionUpdate) -> Result<Subscription> {
        if patch.is_empty() {
            return self.get_or_create(user_id).await;
        }
        subscription::insert_default(self.db.pool(), user_id).await?;
        Ok(subscription::update_subscription(self.db.pool(), user_id, patch).await?)
    }

    /// Look up the owner of a processor subscription.
    pub async fn find_by_stripe_subscription(&self, stripe_subscription_id: &str) -> Result<Option<Subscription>> {
        Ok(subscription::get_by_stripe_subscription_id(self.db.pool(), stripe_subscription_id).await?)
    }
}
