use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    authenticate_primary, second_factor, AuthConfig, PasswordHasher, SecondFactorOutcome,
    SessionKeys, TotpProvider,
};

use super::session_response;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// 6-digit TOTP code; may be omitted on the first round trip.
    pub code: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SecondFactorPrompt {
    pub second_factor_required: bool,
    pub user_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued (cookie set), or a 2FA code is required", body = SecondFactorPrompt),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account temporarily locked; body carries the unlock time"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    hasher: Extension<PasswordHasher>,
    keys: Extension<SessionKeys>,
    totp: Extension<TotpProvider>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    let account =
        match authenticate_primary(&pool, &hasher, request.email.trim(), &request.password).await {
            Ok(account) => account,
            Err(err) => return err.into_response(),
        };

    match second_factor(&keys, &totp, &account, request.code.as_deref()) {
        Ok(SecondFactorOutcome::SessionIssued(token)) => {
            session_response(&config, &account, &token)
        }
        Ok(SecondFactorOutcome::SecondFactorRequired) => (
            StatusCode::OK,
            Json(SecondFactorPrompt {
                second_factor_required: true,
                user_id: account.id,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_accepts_missing_code() -> anyhow::Result<()> {
        let request: LoginRequest = serde_json::from_value(serde_json::json!({
            "email": "joe@smith.com",
            "password": "password123",
        }))?;
        assert!(request.code.is_none());
        Ok(())
    }

    #[test]
    fn prompt_serializes_user_id() -> anyhow::Result<()> {
        let id = Uuid::new_v4();
        let prompt = SecondFactorPrompt {
            second_factor_required: true,
            user_id: id,
        };
        let value = serde_json::to_value(prompt)?;
        assert_eq!(
            value.get("user_id").and_then(serde_json::Value::as_str),
            Some(id.to_string().as_str())
        );
        Ok(())
    }
}
