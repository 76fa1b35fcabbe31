//! Session routes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use database::{user, Role, User, UserUpsert};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WebError};
use crate::session::{MaybeUser, IDENTITY_SIGNATURE_HEADER};
use crate::state::AppState;

/// Identity asserted by the external sign-in provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAssertion {
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Current user, or `null` when signed out.
pub async fn me(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Json<Option<User>> {
    if let Some(user) = &user {
        // Best effort: a failed refresh must not sign the user out.
        if let Err(e) = user::touch_last_signed_in(state.db.pool(), user.id).await {
            warn!(user_id = user.id, error = %e, "Failed to refresh last sign-in");
        }
    }
    Json(user)
}

/// Exchange a signed identity assertion for a session cookie.
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(IDENTITY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebError::Unauthorized)?;
    if !state.sessions.verify_identity(&body, signature) {
        warn!("Rejected identity assertion with a bad signature");
        return Err(WebError::Unauthorized);
    }

    let identity: IdentityAssertion = serde_json::from_slice(&body)
        .map_err(|e| WebError::BadRequest(format!("invalid identity: {e}")))?;

    let is_owner = state.owner_open_id.as_deref() == Some(identity.open_id.as_str());
    let user = user::upsert_user(
        state.db.pool(),
        &UserUpsert {
            open_id: identity.open_id,
            name: identity.name,
            email: identity.email,
            login_method: identity.login_method,
            role: is_owner.then_some(Role::Admin),
        },
    )
    .await?;

    info!(user_id = user.id, "Signed in");

    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.session_cookie(user.id))]),
        Json(user),
    ))
}

/// Clear the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, state.sessions.clear_cookie())]),
        Json(LogoutResponse { success: true }),
    )
}
