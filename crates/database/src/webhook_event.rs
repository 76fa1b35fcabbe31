//! Processed payment-event IDs, used to make webhook redelivery a no-op.

use sqlx::SqlitePool;

use crate::models::WebhookEventRecord;
use crate::Result;

/// Claim an event ID. Returns `false` if it was already recorded.
pub async fn record_event(pool: &SqlitePool, event_id: &str, event_type: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO webhook_events (event_id, event_type)
        VALUES (?, ?)
        ON CONFLICT(event_id) DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(event_type)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Release a claimed event ID so a redelivery is processed again.
pub async fn forget_event(pool: &SqlitePool, event_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM webhook_events
        WHERE event_id = ?
        "#,
    )
    .bind(event_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a recorded event.
pub async fn get_event(pool: &SqlitePool, event_id: &str) -> Result<Option<WebhookEventRecord>> {
    let record = sqlx::query_as::<_, WebhookEventRecord>(
        r#"
        SELECT event_id, event_type, received_at
        FROM webhook_events
        WHERE event_id = ?
        "#,
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
