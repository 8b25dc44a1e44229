pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod two_factor;
pub use self::two_factor::{login_second_factor, verify_second_factor};

pub mod user_me;
pub use self::user_me::{current_user, update_user};

pub mod password;
pub use self::password::{forgot_password, reset_password};

// common functions for the handlers
use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

use crate::auth::{
    session::{self, SessionKeys},
    store, Account, AccountSummary, AuthConfig, AuthError,
};

pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " - ", env!("CARGO_PKG_DESCRIPTION"))
}

pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Resolve the inbound session (cookie or bearer) into an account.
///
/// Missing, tampered, and expired tokens all surface as `InvalidSession`;
/// so does a token whose account no longer exists.
pub(crate) async fn current_account(
    headers: &HeaderMap,
    keys: &SessionKeys,
    pool: &PgPool,
) -> Result<Account, AuthError> {
    let Some(token) = session::extract_session_token(headers) else {
        return Err(AuthError::InvalidSession);
    };
    let claims = keys.verify(&token)?;
    store::find_account_by_id(pool, claims.sub)
        .await?
        .ok_or(AuthError::InvalidSession)
}

/// 200 with the session cookie set and the public account shape in the
/// body. The token travels only in the `HttpOnly` cookie, never in JSON.
pub(crate) fn session_response(config: &AuthConfig, account: &Account, token: &str) -> Response {
    let cookie = match session::session_cookie(token, config.session_cookie_secure()) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("failed to build session cookie: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        response_headers,
        Json(json!({
            "user": AccountSummary::from(account),
            "message": "Login successful",
        })),
    )
        .into_response()
}
