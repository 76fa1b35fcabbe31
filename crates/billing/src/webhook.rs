//! Stripe webhook signature verification and typed event views.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`.
//! The signed payload is `"{t}.{raw body}"`, keyed with the endpoint secret.

use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{BillingError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the IDs Stripe uses for dashboard test deliveries.
const TEST_EVENT_PREFIX: &str = "evt_test_";

/// Verify a webhook signature against the current time.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<()> {
    verify_signature_at(
        payload,
        signature_header,
        secret,
        tolerance,
        chrono::Utc::now().timestamp(),
    )
}

/// Verify a webhook signature as of `now` (unix seconds).
///
/// Any one matching `v1` signature is enough.
pub fn verify_signature_at(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BillingError::WebhookSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(BillingError::WebhookSignature(
            "no v1 signature in header".to_string(),
        ));
    }

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| BillingError::WebhookSignature("malformed timestamp".to_string()))?;
    if now.abs_diff(signed_at) > tolerance.as_secs() {
        return Err(BillingError::WebhookSignature(
            "timestamp outside the tolerance zone".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::WebhookSignature("unusable secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    let matched = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| bool::from(sig.as_slice().ct_eq(expected.as_slice())));

    if matched {
        Ok(())
    } else {
        Err(BillingError::WebhookSignature(
            "no signature matches the payload".to_string(),
        ))
    }
}

/// Verify the signature and parse the body into an event.
pub fn construct_event(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<StripeEvent> {
    verify_signature(payload, signature_header, secret, tolerance)?;
    StripeEvent::parse(payload)
}

/// The event types the application reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CheckoutSessionCompleted,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Other(String),
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            "checkout.session.completed" => EventKind::CheckoutSessionCompleted,
            "customer.subscription.updated" => EventKind::SubscriptionUpdated,
            "customer.subscription.deleted" => EventKind::SubscriptionDeleted,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// A webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub livemode: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

impl StripeEvent {
    /// Parse an event body without verifying it.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| BillingError::MalformedEvent(e.to_string()))
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from(self.event_type.as_str())
    }

    /// Dashboard test deliveries are acknowledged but never applied.
    pub fn is_test_event(&self) -> bool {
        self.id.starts_with(TEST_EVENT_PREFIX)
    }

    fn object<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| BillingError::MalformedEvent(format!("{}: {}", self.event_type, e)))
    }

    pub fn checkout_session(&self) -> Result<CheckoutSessionObject> {
        self.object()
    }

    pub fn subscription(&self) -> Result<SubscriptionObject> {
        self.object()
    }
}

/// `data.object` of a `checkout.session.completed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSessionObject {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        metadata_value(self.metadata.as_ref(), key)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.metadata_value("user_id")?.parse().ok()
    }
}

/// `data.object` of a `customer.subscription.*` event.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl SubscriptionObject {
    pub fn user_id(&self) -> Option<i64> {
        metadata_value(self.metadata.as_ref(), "user_id")?.parse().ok()
    }
}

fn metadata_value<'a>(metadata: Option<&'a HashMap<String, String>>, key: &str) -> Option<&'a str> {
    metadata?
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}
