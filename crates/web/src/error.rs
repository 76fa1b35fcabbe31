//! Error types for the HTTP surface.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use flerte::FlerteError;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum WebError {
    /// Missing or forged session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Service-layer failure.
    #[error(transparent)]
    Flerte(#[from] FlerteError),

    /// Database error outside the service layer.
    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Validation(e) => WebError::BadRequest(e.to_string()),
            other => WebError::Database(other),
        }
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        WebError::BadRequest(rejection.body_text())
    }
}

impl WebError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            WebError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            WebError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            WebError::Flerte(err) => match err {
                FlerteError::NoCredits => (StatusCode::FORBIDDEN, "NO_CREDITS"),
                FlerteError::InvalidPlan(_)
                | FlerteError::InvalidInput(_)
                | FlerteError::WebhookSignature(_)
                | FlerteError::MalformedEvent(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                FlerteError::Payment(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_ERROR"),
                FlerteError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR")
                }
            },
            WebError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use billing::BillingError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (WebError::Unauthorized, StatusCode::UNAUTHORIZED),
            (FlerteError::NoCredits.into(), StatusCode::FORBIDDEN),
            (
                FlerteError::InvalidPlan("gold".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                FlerteError::Payment(BillingError::Network("down".into())).into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
