//! Billing integration for FlerteChat.
//!
//! - [`plans`] - the static plan catalog and credit grants
//! - [`stripe`] - hosted-checkout session creation
//! - [`webhook`] - signature verification and typed webhook events
//!
//! Nothing in this crate touches the database; reconciling events into
//! subscription state is done by the `flerte` crate.

pub mod error;
pub mod plans;
pub mod stripe;
pub mod webhook;

pub use error::{BillingError, Result};
pub use plans::{find_plan, format_price, plan_key, Interval, Plan, PLANS, WEEKLY_CREDITS};
pub use stripe::{
    CheckoutSession, CheckoutSessionParams, PaymentProcessor, StripeClient, StripeConfig,
};
pub use webhook::{construct_event, verify_signature, EventKind, StripeEvent};
