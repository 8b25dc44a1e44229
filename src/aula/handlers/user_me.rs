use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::auth::{password, store, AccountSummary, PasswordHasher, SessionKeys};

use super::current_account;

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    /// Required whenever `password` is present.
    pub old_password: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "The authenticated account", body = AccountSummary),
        (status = 401, description = "Invalid or expired session"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn current_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    keys: Extension<SessionKeys>,
) -> impl IntoResponse {
    match current_account(&headers, &keys, &pool).await {
        Ok(account) => (StatusCode::OK, Json(AccountSummary::from(&account))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/users",
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "Profile updated"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid session or incorrect old password"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn update_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    hasher: Extension<PasswordHasher>,
    keys: Extension<SessionKeys>,
    payload: Option<Json<UpdateUserRequest>>,
) -> impl IntoResponse {
    let account = match current_account(&headers, &keys, &pool).await {
        Ok(account) => account,
        Err(err) => return err.into_response(),
    };

    let request: UpdateUserRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    if let Some(new_password) = request.password.as_deref() {
        // Changing the password needs the current one, even with a live session.
        let Some(old_password) = request.old_password.as_deref() else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Old password is required to change your password."
                })),
            )
                .into_response();
        };

        match hasher.verify(old_password, &account.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Incorrect old password." })),
                )
                    .into_response();
            }
            Err(err) => {
                error!("old password verification failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response();
            }
        }

        if let Err(message) = password::validate_length(new_password) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": [message] })),
            )
                .into_response();
        }

        let password_hash = match hasher.hash(new_password) {
            Ok(hash) => hash,
            Err(err) => {
                error!("password change hashing failed: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response();
            }
        };
        if let Err(err) = store::update_password(&pool, account.id, &password_hash).await {
            error!("password change failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    }

    if request.first_name.is_some() || request.last_name.is_some() {
        let result = store::update_profile(
            &pool,
            account.id,
            request.first_name.as_deref().map(str::trim),
            request.last_name.as_deref().map(str::trim),
        )
        .await;
        if let Err(err) = result {
            error!("profile update failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    }

    StatusCode::NO_CONTENT.into_response()
}
