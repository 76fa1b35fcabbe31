//! Route handlers for the JSON API.

pub mod auth;
pub mod conversations;
pub mod health;
pub mod subscription;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Session
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/session", post(auth::create_session))
        .route("/api/auth/logout", post(auth::logout))
        // Plans and billing
        .route("/api/plans", get(subscription::plans))
        .route(
            "/api/subscription",
            get(subscription::get_subscription).patch(subscription::update_subscription),
        )
        .route("/api/subscription/checkout", post(subscription::create_checkout))
        .route("/api/transactions", get(subscription::transactions))
        // Generation and history
        .route("/api/conversations", get(conversations::list))
        .route("/api/conversations/:id", get(conversations::get))
        .route("/api/messages/generate", post(conversations::generate))
        .route("/api/messages/favorites", get(conversations::favorites))
        .route("/api/messages/:id/favorite", post(conversations::toggle_favorite))
        .route("/api/messages/:id/feedback", post(conversations::feedback))
        // Payment processor
        .route("/api/stripe/webhook", post(webhook::stripe_webhook))
}
