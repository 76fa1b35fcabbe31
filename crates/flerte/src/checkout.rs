//! Hosted-checkout creation for paid plans.

use std::sync::Arc;

use billing::{find_plan, CheckoutSessionParams, Interval, PaymentProcessor};
use database::User;
use tracing::{info, warn};

use crate::error::{FlerteError, Result};

/// Opens checkout sessions for a user's plan choice.
#[derive(Clone)]
pub struct CheckoutService {
    processor: Arc<dyn PaymentProcessor>,
}

impl CheckoutService {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self { processor }
    }

    /// Create a checkout session and return the URL to redirect to.
    ///
    /// Unknown plans and plans with no price for the interval are rejected
    /// without contacting the processor.
    pub async fn create_checkout_session(
        &self,
        user: &User,
        plan_id: &str,
        interval: Interval,
        origin: &str,
    ) -> Result<String> {
        let plan = find_plan(plan_id)
            .ok_or_else(|| FlerteError::InvalidPlan(format!("unknown plan '{plan_id}'")))?;
        let price_id = plan.price_id(interval).ok_or_else(|| {
            FlerteError::InvalidPlan(format!("plan '{plan_id}' is not sold {interval}"))
        })?;

        let params = CheckoutSessionParams {
            user_id: user.id,
            customer_email: user.email.clone(),
            customer_name: user.name.clone(),
            plan: plan.id.to_string(),
            interval,
            price_id: price_id.to_string(),
            origin: origin.to_string(),
        };

        let session = self.processor.create_checkout_session(&params).await?;
        let Some(url) = session.url else {
            warn!(session_id = %session.id, "Checkout session has no URL");
            return Err(FlerteError::Payment(billing::BillingError::Processor {
                status: 200,
                message: "checkout session has no URL".to_string(),
            }));
        };

        info!(user_id = user.id, plan = plan.id, %interval, "Checkout started");
        Ok(url)
    }
}
