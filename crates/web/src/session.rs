//! Signed session cookies and the authenticated-user extractors.
//!
//! The session cookie holds `<user_id>.<hex hmac>`; the MAC is keyed with
//! the server's session secret, so the cookie cannot be forged or moved to
//! another user ID. The same key signs identity assertions handed over by the
//! external sign-in provider.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use database::{user, DatabaseError, User};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "flerte_session";

/// Header carrying the hex HMAC of an identity assertion body.
pub const IDENTITY_SIGNATURE_HEADER: &str = "x-identity-signature";

const SESSION_MAX_AGE_DAYS: i64 = 365;

/// Signs and verifies session tokens and identity assertions.
#[derive(Clone)]
pub struct SessionKeys {
    keyed: HmacSha256,
    secure_cookies: bool,
}

impl SessionKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, InvalidLength> {
        Ok(Self {
            keyed: HmacSha256::new_from_slice(secret.as_ref())?,
            secure_cookies: false,
        })
    }

    /// Mark cookies `Secure` (the site is served over HTTPS).
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    fn mac(&self, domain: &[u8], data: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(domain);
        mac.update(data);
        mac
    }

    fn verify(&self, domain: &[u8], data: &[u8], signature_hex: &str) -> bool {
        let Ok(signature) = hex::decode(signature_hex.trim()) else {
            return false;
        };
        self.mac(domain, data).verify_slice(&signature).is_ok()
    }

    /// Session token for a user.
    pub fn sign_session(&self, user_id: i64) -> String {
        let tag = self.mac(b"session:", user_id.to_string().as_bytes()).finalize().into_bytes();
        format!("{}.{}", user_id, hex::encode(tag))
    }

    /// User ID of a genuine session token.
    pub fn verify_session(&self, token: &str) -> Option<i64> {
        let (id, signature) = token.split_once('.')?;
        let user_id: i64 = id.parse().ok()?;
        self.verify(b"session:", id.as_bytes(), signature).then_some(user_id)
    }

    /// Hex signature for an identity assertion body.
    pub fn sign_identity(&self, body: &[u8]) -> String {
        hex::encode(self.mac(b"identity:", body).finalize().into_bytes())
    }

    pub fn verify_identity(&self, body: &[u8], signature_hex: &str) -> bool {
        self.verify(b"identity:", body, signature_hex)
    }

    /// `Set-Cookie` value establishing a session.
    pub fn session_cookie(&self, user_id: i64) -> String {
        Cookie::build((SESSION_COOKIE, self.sign_session(user_id)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(CookieDuration::days(SESSION_MAX_AGE_DAYS))
            .build()
            .to_string()
    }

    /// `Set-Cookie` value clearing the session.
    pub fn clear_cookie(&self) -> String {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .max_age(CookieDuration::ZERO)
            .build()
            .to_string()
    }

    /// User ID from the request's session cookie, if genuine.
    pub fn session_user_id(&self, headers: &HeaderMap) -> Option<i64> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .and_then(|cookie| self.verify_session(cookie.value()))
    }
}

async fn load_session_user(parts: &Parts, state: &AppState) -> Result<Option<User>, WebError> {
    let Some(user_id) = state.sessions.session_user_id(&parts.headers) else {
        return Ok(None);
    };

    match user::get_user(state.db.pool(), user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(DatabaseError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The signed-in user; rejects with 401 otherwise.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        load_session_user(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(WebError::Unauthorized)
    }
}

/// The signed-in user, if any.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(load_session_user(parts, state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_round_trip() {
        let keys = SessionKeys::new("secret").unwrap();
        let token = keys.sign_session(42);

        assert_eq!(keys.verify_session(&token), Some(42));
        assert_eq!(keys.verify_session("42.deadbeef"), None);
        assert_eq!(keys.verify_session("garbage"), None);

        // A token for one user does not validate for another.
        let (_, signature) = token.split_once('.').unwrap();
        assert_eq!(keys.verify_session(&format!("43.{signature}")), None);

        assert_eq!(SessionKeys::new("other").unwrap().verify_session(&token), None);
    }

    #[test]
    fn test_identity_and_session_signatures_are_distinct() {
        let keys = SessionKeys::new("secret").unwrap();
        let session_signature = keys.sign_session(7).split_once('.').unwrap().1.to_string();

        assert!(!keys.verify_identity(b"7", &session_signature));
        assert!(keys.verify_identity(b"{}", &keys.sign_identity(b"{}")));
    }

    #[test]
    fn test_cookie_extraction() {
        let keys = SessionKeys::new("secret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, keys.sign_session(5)))
                .unwrap(),
        );
        assert_eq!(keys.session_user_id(&headers), Some(5));

        headers.insert(COOKIE, HeaderValue::from_static("flerte_session=5.00"));
        assert_eq!(keys.session_user_id(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let keys = SessionKeys::new("secret").unwrap().with_secure_cookies(true);
        let cookie = keys.session_cookie(1);
        assert!(cookie.starts_with("flerte_session=1."));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age="));

        assert!(keys.clear_cookie().contains("Max-Age=0"));
    }
}
