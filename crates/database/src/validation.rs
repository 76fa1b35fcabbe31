//! Input validation for user-supplied fields.

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Invalid email format.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    /// Plan key with characters outside `[a-z0-9_]`.
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
    /// Value too long.
    #[error("{field} is too long ({actual} chars, max {max})")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Negative credit value other than the unlimited sentinel.
    #[error("{0} must be zero or positive")]
    Negative(String),
    /// Empty value where one is required.
    #[error("{0} cannot be empty")]
    Empty(String),
}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 320;

/// Maximum allowed length for display names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum allowed length for a pasted received message.
pub const MAX_CONTEXT_LENGTH: usize = 4000;

/// Maximum allowed length for a plan key.
pub const MAX_PLAN_LENGTH: usize = 50;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

/// Validate an email address (basic `local@domain.tld` shape).
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }
    check_length("email", email, MAX_EMAIL_LENGTH)?;

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain an @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }
    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must look like example.com".to_string(),
        ));
    }
    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name, MAX_NAME_LENGTH)
}

/// Validate the received message a user pastes in. Empty is allowed.
pub fn validate_context(context: &str) -> Result<(), ValidationError> {
    check_length("context", context, MAX_CONTEXT_LENGTH)
}

/// Validate a stored plan key such as `free` or `pro_monthly`.
pub fn validate_plan_key(plan: &str) -> Result<(), ValidationError> {
    if plan.is_empty() {
        return Err(ValidationError::Empty("plan".to_string()));
    }
    check_length("plan", plan, MAX_PLAN_LENGTH)?;

    if !plan
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidPlan(plan.to_string()));
    }

    Ok(())
}

/// Validate a credit count. `-1` (unlimited) is accepted for totals only.
pub fn validate_credits(field: &str, value: i64, allow_unlimited: bool) -> Result<(), ValidationError> {
    if value >= 0 || (allow_unlimited && value == crate::models::UNLIMITED_CREDITS) {
        Ok(())
    } else {
        Err(ValidationError::Negative(field.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.com.br").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_context_counts_chars() {
        // Multi-byte characters count once each.
        let accented = "é".repeat(MAX_CONTEXT_LENGTH);
        assert!(validate_context(&accented).is_ok());
        assert!(validate_context("").is_ok());

        let too_long = "a".repeat(MAX_CONTEXT_LENGTH + 1);
        assert!(matches!(
            validate_context(&too_long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_plan_key() {
        assert!(validate_plan_key("free").is_ok());
        assert!(validate_plan_key("premium_weekly").is_ok());
        assert!(validate_plan_key("").is_err());
        assert!(matches!(
            validate_plan_key("Pro Monthly"),
            Err(ValidationError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_validate_credits() {
        assert!(validate_credits("creditsRemaining", 0, false).is_ok());
        assert!(validate_credits("creditsTotal", -1, true).is_ok());
        assert!(validate_credits("creditsRemaining", -1, false).is_err());
        assert!(validate_credits("creditsTotal", -5, true).is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooLong {
            field: "context".to_string(),
            max: 4000,
            actual: 4001,
        };
        assert_eq!(err.to_string(), "context is too long (4001 chars, max 4000)");
    }
}
