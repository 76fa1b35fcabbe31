//! Subscription and credit-balance persistence.
//!
//! Each user owns at most one row (`user_id` is unique). Credit deduction is a
//! single conditional `UPDATE`, so concurrent callers can never drive the
//! balance below zero.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Subscription, SubscriptionUpdate, TransactionType};
use crate::validation;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan, status, credits_remaining, credits_total, \
     start_date, end_date, stripe_customer_id, stripe_subscription_id, created_at, updated_at";

/// Ledger description for a consumed credit.
pub const CREDIT_USED_DESCRIPTION: &str = "Geração de mensagem";

/// Get the subscription owned by a user.
pub async fn get_subscription(pool: &SqlitePool, user_id: i64) -> Result<Option<Subscription>> {
    let record = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Find the subscription linked to a processor subscription ID.
pub async fn get_by_stripe_subscription_id(
    pool: &SqlitePool,
    stripe_subscription_id: &str,
) -> Result<Option<Subscription>> {
    let record = sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE stripe_subscription_id = ?"
    ))
    .bind(stripe_subscription_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Insert the default free subscription for a user.
///
/// A row that already exists is left untouched, so racing first calls are
/// absorbed by the unique constraint. Returns whether a row was inserted.
pub async fn insert_default(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO subscriptions (user_id, plan, status, credits_remaining, credits_total)
        VALUES (?, 'free', 'active', 10, 10)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Apply a field-level patch to a user's subscription.
pub async fn update_subscription(
    pool: &SqlitePool,
    user_id: i64,
    update: &SubscriptionUpdate,
) -> Result<Subscription> {
    if let Some(plan) = update.plan.as_deref() {
        validation::validate_plan_key(plan)?;
    }
    if let Some(remaining) = update.credits_remaining {
        validation::validate_credits("creditsRemaining", remaining, true)?;
    }
    if let Some(total) = update.credits_total {
        validation::validate_credits("creditsTotal", total, true)?;
    }

    let result = sqlx::query(
        r#"
        UPDATE subscriptions SET
            plan = COALESCE(?, plan),
            status = COALESCE(?, status),
            credits_remaining = COALESCE(?, credits_remaining),
            credits_total = COALESCE(?, credits_total),
            end_date = CASE WHEN ? THEN ? ELSE end_date END,
            stripe_customer_id = CASE WHEN ? THEN ? ELSE stripe_customer_id END,
            stripe_subscription_id = CASE WHEN ? THEN ? ELSE stripe_subscription_id END,
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(&update.plan)
    .bind(update.status)
    .bind(update.credits_remaining)
    .bind(update.credits_total)
    .bind(update.end_date.is_some())
    .bind(update.end_date.clone().flatten())
    .bind(update.stripe_customer_id.is_some())
    .bind(update.stripe_customer_id.clone().flatten())
    .bind(update.stripe_subscription_id.is_some())
    .bind(update.stripe_subscription_id.clone().flatten())
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Subscription", user_id));
    }

    get_subscription(pool, user_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Subscription", user_id))
}

/// Consume one credit if the balance is positive.
///
/// The decrement and the `credit_used` ledger row commit together. Returns
/// `false` without writing anything when the balance is already zero or the
/// user has no subscription.
pub async fn deduct_credit(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET credits_remaining = credits_remaining - 1,
            updated_at = datetime('now')
        WHERE user_id = ? AND credits_remaining > 0
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, type, amount, description)
        VALUES (?, ?, 1, ?)
        "#,
    )
    .bind(user_id)
    .bind(TransactionType::CreditUsed)
    .bind(CREDIT_USED_DESCRIPTION)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
