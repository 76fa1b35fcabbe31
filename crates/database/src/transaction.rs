//! Append-only ledger of credit use and purchases.

use sqlx::SqlitePool;

use crate::models::{NewTransaction, Transaction};
use crate::Result;

/// Append a ledger row.
pub async fn create_transaction(pool: &SqlitePool, transaction: &NewTransaction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, type, amount, description, stripe_payment_intent_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(transaction.user_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount)
    .bind(&transaction.description)
    .bind(&transaction.stripe_payment_intent_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's ledger, newest first.
pub async fn list_transactions(pool: &SqlitePool, user_id: i64) -> Result<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, user_id, type, amount, description, stripe_payment_intent_id, created_at
        FROM transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
