//! Conversation persistence.
//!
//! Reads are always scoped by the owning user.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, NewConversation};

const CONVERSATION_COLUMNS: &str = "id, user_id, title, context, tone, created_at, updated_at";

/// Create a conversation and return the stored row.
pub async fn create_conversation(
    pool: &SqlitePool,
    conversation: &NewConversation,
) -> Result<Conversation> {
    let result = sqlx::query(
        r#"
        INSERT INTO conversations (user_id, title, context, tone)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(conversation.user_id)
    .bind(&conversation.title)
    .bind(&conversation.context)
    .bind(&conversation.tone)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get_conversation(pool, id, conversation.user_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Conversation", id))
}

/// List a user's conversations, newest first.
pub async fn list_conversations(pool: &SqlitePool, user_id: i64) -> Result<Vec<Conversation>> {
    let rows = sqlx::query_as::<_, Conversation>(&format!(
        r#"
        SELECT {CONVERSATION_COLUMNS}
        FROM conversations
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get a conversation if it exists and belongs to the user.
pub async fn get_conversation(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<Conversation>> {
    let record = sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Count a user's conversations.
pub async fn count_conversations(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM conversations WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
