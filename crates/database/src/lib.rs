//! SQLite persistence layer for FlerteChat.
//!
//! This crate provides async database operations for users, subscriptions,
//! conversations, messages and the credit ledger using SQLx with SQLite.
//! Every accessor takes the pool explicitly; nothing here is global.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::UserUpsert, subscription, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:flerte.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Sign a user in
//!     let user = user::upsert_user(
//!         db.pool(),
//!         &UserUpsert {
//!             open_id: "oauth|123".to_string(),
//!             name: Some("Bia".to_string()),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//!     subscription::insert_default(db.pool(), user.id).await?;
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod message;
pub mod models;
pub mod subscription;
pub mod transaction;
pub mod user;
pub mod validation;
pub mod webhook_event;

pub use error::{DatabaseError, Result};
pub use models::{
    Conversation, Feedback, Message, MessageType, NewConversation, NewMessage, NewTransaction,
    Role, Subscription, SubscriptionStatus, SubscriptionUpdate, Transaction, TransactionType,
    User, UserUpsert, WebhookEventRecord,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/flerte.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing); each connection gets its own
    /// // database, so keep the pool at one connection.
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(pool_size, "Connected to database");

        Ok(Self { pool })
    }

    /// Open a fresh, migrated in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect_with_pool_size("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generation_round_trip() {
        let db = Database::in_memory().await.unwrap();
        let pool = db.pool();

        let user = user::upsert_user(
            pool,
            &UserUpsert {
                open_id: "open-1".to_string(),
                name: Some("Ana".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let conversation = conversation::create_conversation(
            pool,
            &NewConversation {
                user_id: user.id,
                title: "Sumiu hein".to_string(),
                context: Some("Sumiu hein".to_string()),
                tone: "funny".to_string(),
            },
        )
        .await
        .unwrap();

        for content in ["um", "dois", "três"] {
            message::add_message(
                pool,
                &NewMessage {
                    conversation_id: conversation.id,
                    user_id: user.id,
                    message_type: MessageType::Generated,
                    content: content.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let fetched = conversation::get_conversation(pool, conversation.id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.title, "Sumiu hein");

        let messages = message::list_messages(pool, conversation.id).await.unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["um", "dois", "três"]);
        assert!(messages.iter().all(|m| !m.is_favorite));
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::in_memory().await.unwrap();

        let result = subscription::insert_default(db.pool(), 999).await;
        assert!(matches!(result, Err(DatabaseError::Sqlx(_))));
    }
}
