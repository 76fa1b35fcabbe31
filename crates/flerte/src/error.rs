//! Error types for FlerteChat operations.

use billing::BillingError;
use database::DatabaseError;
use thiserror::Error;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum FlerteError {
    /// The user's balance is exhausted.
    #[error("NO_CREDITS")]
    NoCredits,

    /// Unknown plan, or a plan without a price for the interval.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Request input rejected before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Webhook signature missing, stale or wrong.
    #[error("{0}")]
    WebhookSignature(String),

    /// Signed webhook body that is not a usable event.
    #[error("malformed webhook event: {0}")]
    MalformedEvent(String),

    /// The payment processor failed or was unreachable.
    #[error("{0}")]
    Payment(BillingError),

    /// Storage failure.
    #[error("database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for FlerteError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Validation(e) => FlerteError::InvalidInput(e.to_string()),
            other => FlerteError::Database(other),
        }
    }
}

impl From<BillingError> for FlerteError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidPlan(plan) => FlerteError::InvalidPlan(plan),
            BillingError::WebhookSignature(reason) => FlerteError::WebhookSignature(reason),
            BillingError::MalformedEvent(reason) => FlerteError::MalformedEvent(reason),
            other => FlerteError::Payment(other),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, FlerteError>;
