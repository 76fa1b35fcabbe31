//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use billing::PaymentProcessor;
use database::Database;
use flerte::{CheckoutService, ConversationHistory, MessageGenerator, SubscriptionManager, WebhookHandler};
use llm_core::CompletionProvider;

use crate::session::SessionKeys;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    pub sessions: SessionKeys,
    pub subscriptions: SubscriptionManager,
    pub generator: Arc<MessageGenerator>,
    pub history: ConversationHistory,
    pub checkout: CheckoutService,
    pub webhooks: WebhookHandler,
    /// Checkout origin when the request carries no `Origin` header.
    pub public_url: String,
    /// openId promoted to admin on sign-in.
    pub owner_open_id: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        sessions: SessionKeys,
        provider: Arc<dyn CompletionProvider>,
        processor: Arc<dyn PaymentProcessor>,
        webhooks: WebhookHandler,
    ) -> Self {
        Self {
            subscriptions: SubscriptionManager::new(db.clone()),
            generator: Arc::new(MessageGenerator::new(db.clone(), provider)),
            history: ConversationHistory::new(db.clone()),
            checkout: CheckoutService::new(processor),
            webhooks,
            sessions,
            db,
            public_url: "http://localhost:3000".to_string(),
            owner_open_id: None,
        }
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    pub fn with_owner(mut self, open_id: Option<String>) -> Self {
        self.owner_open_id = open_id;
        self
    }

    /// Per-call completion timeout used by reply generation.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        let generator = MessageGenerator::clone(&self.generator).with_call_timeout(timeout);
        self.generator = Arc::new(generator);
        self
    }
}
