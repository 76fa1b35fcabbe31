//! Plans, subscription and checkout routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::Json;
use billing::{Interval, Plan, PLANS};
use database::{Subscription, SubscriptionUpdate, Transaction};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: String,
    pub interval: Interval,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Plan catalog for the pricing page.
pub async fn plans() -> Json<&'static [Plan]> {
    Json(PLANS)
}

/// Current subscription, created on first access.
pub async fn get_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Subscription>> {
    Ok(Json(state.subscriptions.get_or_create(user.id).await?))
}

/// Free-form patch of the caller's subscription.
pub async fn update_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: std::result::Result<Json<SubscriptionUpdate>, JsonRejection>,
) -> Result<Json<Subscription>> {
    let Json(mut patch) = payload?;
    // Processor identifiers are written by webhooks only.
    patch.stripe_customer_id = None;
    patch.stripe_subscription_id = None;

    let updated = state.subscriptions.update(user.id, &patch).await?;
    info!(user_id = user.id, plan = %updated.plan, "Subscription patched by user");
    Ok(Json(updated))
}

/// Start a hosted checkout for a paid plan.
pub async fn create_checkout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    headers: HeaderMap,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let Json(request) = payload?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "null")
        .unwrap_or(&state.public_url);

    let url = state
        .checkout
        .create_checkout_session(&user, &request.plan, request.interval, origin)
        .await?;
    Ok(Json(CheckoutResponse { url }))
}

/// The caller's credit ledger, newest first.
pub async fn transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Transaction>>> {
    Ok(Json(state.history.list_transactions(user.id).await?))
}
