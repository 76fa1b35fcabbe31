//! Billing error types.

use thiserror::Error;

/// Errors that can occur while talking to the payment processor.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Unknown plan, or a plan that cannot be bought for the interval.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// The webhook signature header is missing, malformed, stale or wrong.
    #[error("webhook signature verification failed: {0}")]
    WebhookSignature(String),

    /// The webhook body is not a well-formed event.
    #[error("malformed webhook payload: {0}")]
    MalformedEvent(String),

    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The processor rejected the request.
    #[error("payment processor error ({status}): {message}")]
    Processor { status: u16, message: String },

    /// The processor could not be reached.
    #[error("network error: {0}")]
    Network(String),
}

/// Result type for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;
