//! Conversation history, favorites and the credit ledger, all scoped by user.

use database::{conversation, message, transaction, Conversation, Database, Feedback, Message, Transaction};
use serde::Serialize;

use crate::error::Result;

/// A conversation together with its messages, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationWithMessages {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Read access to a user's history plus the favorite and feedback toggles.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    db: Database,
}

impl ConversationHistory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest first.
    pub async fn list_conversations(&self, user_id: i64) -> Result<Vec<Conversation>> {
        Ok(conversation::list_conversations(self.db.pool(), user_id).await?)
    }

    /// `None` when the conversation does not exist or belongs to someone else.
    pub async fn get_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> Result<Option<ConversationWithMessages>> {
        let Some(conversation) =
            conversation::get_conversation(self.db.pool(), conversation_id, user_id).await?
        else {
            return Ok(None);
        };

        let messages = message::list_messages(self.db.pool(), conversation.id).await?;
        Ok(Some(ConversationWithMessages {
            conversation,
            messages,
        }))
    }

    pub async fn toggle_favorite(&self, user_id: i64, message_id: i64) -> Result<Option<Message>> {
        Ok(message::toggle_favorite(self.db.pool(), message_id, user_id).await?)
    }

    /// Set or clear (`None`) the feedback on a message.
    pub async fn set_feedback(
        &self,
        user_id: i64,
        message_id: i64,
        feedback: Option<Feedback>,
    ) -> Result<Option<Message>> {
        Ok(message::set_feedback(self.db.pool(), message_id, user_id, feedback).await?)
    }

    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<Message>> {
        Ok(message::list_favorites(self.db.pool(), user_id).await?)
    }

    /// Credit ledger, newest first.
    pub async fn list_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        Ok(transaction::list_transactions(self.db.pool(), user_id).await?)
    }
}
