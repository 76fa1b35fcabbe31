//! User persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{User, UserUpsert};
use crate::validation;

const USER_COLUMNS: &str =
    "id, open_id, name, email, login_method, role, created_at, updated_at, last_signed_in";

/// Insert a user, or refresh the mutable fields of an existing one.
///
/// Fields left as `None` keep their stored value. `last_signed_in` is always
/// bumped.
pub async fn upsert_user(pool: &SqlitePool, user: &UserUpsert) -> Result<User> {
    if user.open_id.trim().is_empty() {
        return Err(validation::ValidationError::Empty("openId".to_string()).into());
    }
    if let Some(email) = user.email.as_deref() {
        validation::validate_email(email)?;
    }
    if let Some(name) = user.name.as_deref() {
        validation::validate_name(name)?;
    }

    sqlx::query(
        r#"
        INSERT INTO users (open_id, name, email, login_method, role)
        VALUES (?, ?, ?, ?, COALESCE(?, 'user'))
        ON CONFLICT(open_id) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            email = COALESCE(excluded.email, users.email),
            login_method = COALESCE(excluded.login_method, users.login_method),
            role = COALESCE(?, users.role),
            updated_at = datetime('now'),
            last_signed_in = datetime('now')
        "#,
    )
    .bind(&user.open_id)
    .bind(&user.name)
    .bind(user.email.as_deref().map(str::trim))
    .bind(&user.login_method)
    .bind(user.role)
    .bind(user.role)
    .execute(pool)
    .await?;

    get_user_by_open_id(pool, &user.open_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", &user.open_id))
}

/// Get a user by surrogate ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Get a user by the auth provider's identifier.
pub async fn get_user_by_open_id(pool: &SqlitePool, open_id: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE open_id = ?"))
            .bind(open_id)
            .fetch_optional(pool)
            .await?;

    Ok(user)
}

/// Record a sign-in without touching any other field.
pub async fn touch_last_signed_in(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET last_signed_in = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    Ok(())
}
