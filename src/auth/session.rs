//! Stateless session tokens and their cookie/bearer presentation.
//!
//! A session is a signed JWT carrying the account id, email, and a claim
//! that the second factor was satisfied. Validity is purely cryptographic
//! plus an expiry check; nothing is stored server-side, so a session cannot
//! be revoked before its one hour lifetime runs out.

use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

pub const SESSION_COOKIE_NAME: &str = "aula_session";

/// Fixed absolute session lifetime.
pub const SESSION_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id.
    pub sub: Uuid,
    pub email: String,
    /// Second factor satisfied for this session.
    pub mfa: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Symmetric signing keys derived from the server-held secret. The secret
/// is injected once at construction and never appears in tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a signed session token expiring in [`SESSION_TTL_SECONDS`].
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if signing fails.
    pub fn issue(&self, account_id: Uuid, email: &str, mfa: bool) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: account_id,
            email: email.to_string(),
            mfa,
            iat,
            exp: iat + SESSION_TTL_SECONDS,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to sign session: {err}")))
    }

    /// Check signature integrity and expiry.
    ///
    /// # Errors
    /// Every failure mode (bad signature, malformed token, expired) is the
    /// same `InvalidSession`, so callers cannot tell them apart.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidSession)
    }
}

/// Build the `Set-Cookie` value for a freshly issued session.
///
/// # Errors
/// Returns an error if the token contains bytes invalid in a header.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={SESSION_TTL_SECONDS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session token from the cookie, or from a bearer header for
/// non-browser clients.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
