//! Error taxonomy for the authentication core.
//!
//! Several variants intentionally cover more than one internal cause:
//! `InvalidCredentials` is returned for unknown emails and for wrong
//! passwords, `InvalidSession` for tampered, malformed, and expired tokens,
//! and `InvalidOrExpiredToken` for unknown, expired, and already-used reset
//! tokens. The distinctions stay visible in logs, never in responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account locked until {until}")]
    AccountLocked {
        until: DateTime<Utc>,
        remaining_minutes: i64,
    },

    /// Not a failure: the primary check passed and a TOTP code is needed.
    #[error("second factor required")]
    SecondFactorRequired,

    #[error("invalid second factor")]
    InvalidSecondFactor,

    #[error("invalid session")]
    InvalidSession,

    #[error("invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("validation failed")]
    Validation(Vec<String>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid email or password" })),
            )
                .into_response(),
            Self::AccountLocked {
                until,
                remaining_minutes,
            } => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "message": "Your account is temporarily locked.",
                    "unlock_time": until,
                    "remaining_minutes": remaining_minutes,
                })),
            )
                .into_response(),
            Self::SecondFactorRequired => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "message": "Second factor required",
                    "second_factor_required": true,
                })),
            )
                .into_response(),
            Self::InvalidSecondFactor => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid 2FA code" })),
            )
                .into_response(),
            Self::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid or expired session" })),
            )
                .into_response(),
            Self::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid or expired token" })),
            )
                .into_response(),
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Self::Internal(err) => {
                // Cause stays in the logs; the response carries no detail.
                error!("internal auth error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AccountLocked {
                until: Utc::now(),
                remaining_minutes: 5,
            }
            .into_response()
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InvalidSecondFactor.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidSession.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidOrExpiredToken.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Validation(vec!["bad".to_string()])
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn infrastructure_errors_convert() {
        fn fails() -> Result<(), AuthError> {
            let result: anyhow::Result<()> = Err(anyhow!("db down"));
            result?;
            Ok(())
        }
        assert!(matches!(fails(), Err(AuthError::Internal(_))));
    }
}
