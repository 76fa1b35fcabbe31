//! Generation, history and message routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use database::{Conversation, Feedback, Message};
use flerte::{ConversationWithMessages, GenerateRequest, GenerateResponse};
use serde::Deserialize;

use crate::error::Result;
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: Option<Feedback>,
}

/// The caller's conversations, newest first.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Conversation>>> {
    Ok(Json(state.history.list_conversations(user.id).await?))
}

/// One conversation with its messages; `null` if missing or not owned.
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Option<ConversationWithMessages>>> {
    Ok(Json(state.history.get_conversation(user.id, id).await?))
}

/// Generate three reply suggestions, charging one credit.
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.generator.generate(user.id, &request).await?))
}

/// Flip a message's favorite flag; `null` if missing or not owned.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Option<Message>>> {
    Ok(Json(state.history.toggle_favorite(user.id, id).await?))
}

pub async fn feedback(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    payload: std::result::Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<Option<Message>>> {
    let Json(request) = payload?;
    Ok(Json(state.history.set_feedback(user.id, id, request.feedback).await?))
}

pub async fn favorites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Message>>> {
    Ok(Json(state.history.list_favorites(user.id).await?))
}
