use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    second_factor, store, AuthConfig, SecondFactorOutcome, SessionKeys, TotpProvider,
};

use super::session_response;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SecondFactorRequest {
    pub user_id: Uuid,
    pub code: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct VerifyResponse {
    pub valid: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/users/login/2fa",
    request_body = SecondFactorRequest,
    responses(
        (status = 200, description = "Code accepted; session cookie set"),
        (status = 401, description = "Invalid 2FA code"),
        (status = 404, description = "Unknown user id"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login_second_factor(
    pool: Extension<PgPool>,
    config: Extension<AuthConfig>,
    keys: Extension<SessionKeys>,
    totp: Extension<TotpProvider>,
    payload: Option<Json<SecondFactorRequest>>,
) -> impl IntoResponse {
    let request: SecondFactorRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    let account = match store::find_account_by_id(&pool, request.user_id).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "User not found." })),
            )
                .into_response();
        }
        Err(err) => {
            error!("2FA login lookup failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    };

    // 2FA failures never feed the primary lockout counter.
    match second_factor(&keys, &totp, &account, Some(request.code.as_str())) {
        Ok(SecondFactorOutcome::SessionIssued(token)) => {
            session_response(&config, &account, &token)
        }
        // Unreachable with a code supplied, but harmless to map.
        Ok(SecondFactorOutcome::SecondFactorRequired) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid 2FA code" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/users/verify-2fa",
    request_body = SecondFactorRequest,
    responses(
        (status = 200, description = "Code checked", body = VerifyResponse),
        (status = 401, description = "Invalid 2FA code", body = VerifyResponse),
        (status = 404, description = "Unknown user id"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_second_factor(
    pool: Extension<PgPool>,
    totp: Extension<TotpProvider>,
    payload: Option<Json<SecondFactorRequest>>,
) -> impl IntoResponse {
    let request: SecondFactorRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    let account = match store::find_account_by_id(&pool, request.user_id).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "User not found." })),
            )
                .into_response();
        }
        Err(err) => {
            error!("2FA verification lookup failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    };

    let valid = match account.totp_secret.as_deref() {
        Some(secret) => match totp.verify(secret, request.code.trim()) {
            Ok(valid) => valid,
            Err(err) => {
                error!("2FA verification failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response();
            }
        },
        None => false,
    };

    if valid {
        (
            StatusCode::OK,
            Json(VerifyResponse {
                valid: true,
                message: "2FA verification successful.".to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                valid: false,
                message: "Invalid 2FA code".to_string(),
            }),
        )
            .into_response()
    }
}
