//! Payment-processor webhook endpoint.
//!
//! Responds 400 only for signature or parse failures, 500 when applying the
//! event failed (so the processor retries), 200 otherwise.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flerte::{FlerteError, WebhookOutcome};
use serde_json::json;
use tracing::{debug, warn};

use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

pub async fn stripe_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "Missing stripe-signature header").into_response();
    };

    match state.webhooks.handle(&body, signature).await {
        Ok(WebhookOutcome::TestEvent) => Json(json!({ "verified": true })).into_response(),
        Ok(outcome) => {
            debug!(?outcome, "Webhook acknowledged");
            Json(json!({ "received": true })).into_response()
        }
        Err(FlerteError::WebhookSignature(reason) | FlerteError::MalformedEvent(reason)) => {
            warn!(%reason, "Rejected webhook");
            (StatusCode::BAD_REQUEST, format!("Webhook Error: {reason}")).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Webhook processing failed" })),
        )
            .into_response(),
    }
}
