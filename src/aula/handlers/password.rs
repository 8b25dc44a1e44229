use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::auth::{reset, AuthConfig, PasswordHasher};

/// One response body for matches and non-matches alike.
const FORGOT_MESSAGE: &str = "If that email exists, a reset link has been generated.";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/password/forgot",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Always reported, whether or not the email matches an account"),
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    match reset::request(&pool, &config, request.email.trim()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": FORGOT_MESSAGE })),
        )
            .into_response(),
        Err(err) => {
            error!("reset request failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced"),
        (status = 400, description = "Invalid or expired token, or bad password shape"),
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    hasher: Extension<PasswordHasher>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    match reset::redeem(&pool, &hasher, &request.token, &request.new_password).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Password has been reset successfully" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgot_request_round_trips() -> anyhow::Result<()> {
        let request: ForgotPasswordRequest = serde_json::from_value(json!({
            "email": "joe@smith.com",
        }))?;
        assert_eq!(request.email, "joe@smith.com");
        Ok(())
    }

    #[test]
    fn reset_request_round_trips() -> anyhow::Result<()> {
        let request: ResetPasswordRequest = serde_json::from_value(json!({
            "token": "abc123",
            "new_password": "password123",
        }))?;
        assert_eq!(request.token, "abc123");
        assert_eq!(request.new_password, "password123");
        Ok(())
    }
}
