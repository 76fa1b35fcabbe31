//! Message persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Feedback, Message, NewMessage};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, user_id, type, content, is_favorite, feedback, created_at";

/// Add a message and return the stored row.
pub async fn add_message(pool: &SqlitePool, message: &NewMessage) -> Result<Message> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (conversation_id, user_id, type, content)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(message.conversation_id)
    .bind(message.user_id)
    .bind(message.message_type)
    .bind(&message.content)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get_message(pool, id, message.user_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Message", id))
}

/// Get a message if it belongs to the user.
pub async fn get_message(pool: &SqlitePool, id: i64, user_id: i64) -> Result<Option<Message>> {
    let record = sqlx::query_as::<_, Message>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List the messages of a conversation in creation order.
///
/// Callers must check conversation ownership first.
pub async fn list_messages(pool: &SqlitePool, conversation_id: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flip the favorite flag of a user's message.
///
/// Returns `None` if the message does not exist or belongs to someone else.
pub async fn toggle_favorite(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<Message>> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET is_favorite = NOT is_favorite
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_message(pool, id, user_id).await
}

/// Record (or clear) feedback on a user's message.
pub async fn set_feedback(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    feedback: Option<Feedback>,
) -> Result<Option<Message>> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET feedback = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(feedback)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_message(pool, id, user_id).await
}

/// List a user's favorite messages, newest first.
pub async fn list_favorites(pool: &SqlitePool, user_id: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM messages
        WHERE user_id = ? AND is_favorite = 1
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageType, NewConversation, UserUpsert};
    use crate::{conversation, user, Database};

    async fn seed(db: &Database, open_id: &str) -> (i64, Message) {
        let user_id = user::upsert_user(
            db.pool(),
            &UserUpsert {
                open_id: open_id.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;
        let convo = conversation::create_conversation(
            db.pool(),
            &NewConversation {
                user_id,
                title: "t".to_string(),
                context: None,
                tone: "bold".to_string(),
            },
        )
        .await
        .unwrap();
        let message = add_message(
            db.pool(),
            &NewMessage {
                conversation_id: convo.id,
                user_id,
                message_type: MessageType::Generated,
                content: "bora marcar?".to_string(),
            },
        )
        .await
        .unwrap();
        (user_id, message)
    }

    #[tokio::test]
    async fn test_toggle_favorite_is_its_own_inverse() {
        let db = Database::in_memory().await.unwrap();
        let (user_id, message) = seed(&db, "fav").await;
        assert!(!message.is_favorite);

        let once = toggle_favorite(db.pool(), message.id, user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(once.is_favorite);
        assert_eq!(list_favorites(db.pool(), user_id).await.unwrap().len(), 1);

        let twice = toggle_favorite(db.pool(), message.id, user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!twice.is_favorite);
        assert!(list_favorites(db.pool(), user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_other_users_message() {
        let db = Database::in_memory().await.unwrap();
        let (_, message) = seed(&db, "owner").await;
        let (intruder, _) = seed(&db, "intruder").await;

        assert!(toggle_favorite(db.pool(), message.id, intruder)
            .await
            .unwrap()
            .is_none());
        assert!(toggle_favorite(db.pool(), 9999, intruder)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_set_feedback() {
        let db = Database::in_memory().await.unwrap();
        let (user_id, message) = seed(&db, "fb").await;

        let rated = set_feedback(db.pool(), message.id, user_id, Some(Feedback::NotHelpful))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rated.feedback, Some(Feedback::NotHelpful));

        let cleared = set_feedback(db.pool(), message.id, user_id, None)
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.feedback.is_none());
    }
}
