//! FlerteChat service layer.
//!
//! This crate sits between the HTTP surface and storage:
//!
//! - [`SubscriptionManager`] owns plans and credit balances
//! - [`MessageGenerator`] turns a received message and a [`Tone`] into three
//!   reply suggestions, charging one credit
//! - [`ConversationHistory`] reads past generations and toggles favorites
//! - [`CheckoutService`] opens hosted checkouts for paid plans
//! - [`WebhookHandler`] applies payment-processor events
//!
//! # Architecture
//!
//! ```text
//! generate(user, context, tone)
//!          ↓
//! ┌──────────────────────────────────────────────┐
//! │ 1. get_or_create subscription                │
//! │ 2. refuse (NO_CREDITS) or deduct one credit  │
//! │ 3. create conversation                       │
//! │ 4. 3 × provider.complete(), concurrently     │
//! │ 5. clean, persist, return                    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use flerte::{GenerateRequest, MessageGenerator, Tone};
//!
//! let generator = MessageGenerator::new(db, Arc::new(provider));
//! let response = generator
//!     .generate(user_id, &GenerateRequest {
//!         context: "Sumiu hein".to_string(),
//!         tone: Tone::Funny,
//!         conversation_id: None,
//!     })
//!     .await?;
//! assert_eq!(response.messages.len(), 3);
//! ```

pub mod checkout;
pub mod credits;
mod error;
pub mod generator;
pub mod history;
pub mod prompt;
pub mod webhook;

pub use checkout::CheckoutService;
pub use credits::{PlanChange, SubscriptionManager};
pub use error::{FlerteError, Result};
pub use generator::{GenerateRequest, GenerateResponse, GeneratedReply, MessageGenerator};
pub use history::{ConversationHistory, ConversationWithMessages};
pub use prompt::{Tone, FALLBACK_REPLY};
pub use webhook::{map_subscription_status, WebhookHandler, WebhookOutcome};
