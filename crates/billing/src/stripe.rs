//! Stripe hosted-checkout client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{BillingError, Result};
use crate::plans::Interval;

/// Default tolerance for webhook timestamps.
pub const DEFAULT_WEBHOOK_TOLERANCE: Duration = Duration::from_secs(300);

/// Configuration for the Stripe client and webhook verification.
#[derive(Clone)]
pub struct StripeConfig {
    /// Base URL; `/v1/...` paths are appended.
    pub api_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    /// Maximum age of a signed webhook timestamp.
    pub webhook_tolerance: Duration,
    pub timeout: Duration,
}

// Keys stay out of logs.
impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_url", &self.api_url)
            .field("webhook_tolerance", &self.webhook_tolerance)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.stripe.com".to_string(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
            timeout: Duration::from_secs(30),
        }
    }
}

impl StripeConfig {
    /// Create configuration from environment variables.
    ///
    /// Required: `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`.
    /// Optional: `STRIPE_API_URL` (default: https://api.stripe.com).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?;
        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            BillingError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;
        let api_url = env::var("STRIPE_API_URL").unwrap_or(defaults.api_url);

        Ok(Self {
            api_url,
            secret_key,
            webhook_secret,
            ..defaults
        })
    }

    pub fn builder() -> StripeConfigBuilder {
        StripeConfigBuilder::default()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

/// Builder for StripeConfig.
#[derive(Debug, Default)]
pub struct StripeConfigBuilder {
    config: StripeConfig,
}

impl StripeConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn secret_key(mut self, key: impl Into<String>) -> Self {
        self.config.secret_key = key.into();
        self
    }

    pub fn webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.webhook_secret = secret.into();
        self
    }

    pub fn webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.config.webhook_tolerance = tolerance;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> StripeConfig {
        self.config
    }
}

/// Everything needed to open a subscription checkout for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub user_id: i64,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub plan: String,
    pub interval: Interval,
    pub price_id: String,
    /// Scheme + host the customer is redirected back to.
    pub origin: String,
}

impl CheckoutSessionParams {
    pub fn success_url(&self) -> String {
        format!("{}/app?checkout=success", self.origin.trim_end_matches('/'))
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/plans?checkout=cancelled", self.origin.trim_end_matches('/'))
    }

    /// Metadata attached to the session and to the subscription it creates.
    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", self.user_id.to_string()),
            (
                "customer_email",
                self.customer_email.clone().unwrap_or_default(),
            ),
            ("customer_name", self.customer_name.clone().unwrap_or_default()),
            ("plan", self.plan.clone()),
            ("interval", self.interval.to_string()),
        ]
    }

    /// Form body for `POST /v1/checkout/sessions`.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][price]".to_string(), self.price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("client_reference_id".to_string(), self.user_id.to_string()),
            ("allow_promotion_codes".to_string(), "true".to_string()),
            ("success_url".to_string(), self.success_url()),
            ("cancel_url".to_string(), self.cancel_url()),
        ];

        if let Some(email) = self.customer_email.as_deref().filter(|e| !e.is_empty()) {
            form.push(("customer_email".to_string(), email.to_string()));
        }

        for (key, value) in self.metadata() {
            form.push((format!("metadata[{key}]"), value.clone()));
            form.push((format!("subscription_data[metadata][{key}]"), value));
        }

        form
    }
}

/// A created hosted-checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// A payment processor able to open hosted checkouts.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_checkout_session(&self, params: &CheckoutSessionParams)
        -> Result<CheckoutSession>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe REST client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self> {
        if config.secret_key.is_empty() {
            return Err(BillingError::Configuration(
                "Stripe secret key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BillingError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        info!(api_url = %config.api_url, "Stripe client initialized");

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession> {
        debug!(
            user_id = params.user_id,
            plan = %params.plan,
            interval = %params.interval,
            "Creating checkout session"
        );

        let response = self
            .client
            .post(self.config.endpoint("/v1/checkout/sessions"))
            .bearer_auth(&self.config.secret_key)
            .form(&params.to_form())
            .send()
            .await
            .map_err(|e| BillingError::Network(format!("Failed to reach Stripe: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), error = %message, "Stripe rejected checkout session");
            return Err(BillingError::Processor {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = serde_json::from_str(&body).map_err(|e| {
            BillingError::Processor {
                status: status.as_u16(),
                message: format!("unexpected checkout response: {e}"),
            }
        })?;

        info!(
            user_id = params.user_id,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(session)
    }
}
