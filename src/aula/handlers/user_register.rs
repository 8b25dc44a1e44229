use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    password,
    store::{self, InsertOutcome},
    PasswordHasher, Role, TotpProvider,
};

use super::valid_email;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `student` when omitted.
    pub role: Option<Role>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
    /// Base32 TOTP secret, surfaced once for manual backup.
    pub secret: String,
    pub otpauth_url: String,
    /// `data:image/png;base64,...` QR rendering of the provisioning URI.
    pub qr_code: String,
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; scan the QR code to finish 2FA setup", body = RegisterResponse),
        (status = 400, description = "Validation error or duplicate email"),
    ),
    tag = "users"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    hasher: Extension<PasswordHasher>,
    totp: Extension<TotpProvider>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
        }
    };

    let mut errors = Vec::new();
    if request.first_name.trim().is_empty() {
        errors.push("Please provide a first name.".to_string());
    }
    if request.last_name.trim().is_empty() {
        errors.push("Please provide a last name.".to_string());
    }
    let email = request.email.trim();
    if !valid_email(email) {
        errors.push("Please enter a valid email address.".to_string());
    }
    if let Err(message) = password::validate_length(&request.password) {
        errors.push(message);
    }
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response();
    }

    let password_hash = match hasher.hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("registration hashing failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    };

    // Every account gets a secret at creation; the client decides when the
    // user actually scans it.
    let enrollment = match totp.enroll(email) {
        Ok(enrollment) => enrollment,
        Err(err) => {
            error!("TOTP enrollment failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response();
        }
    };

    let role = request.role.unwrap_or(Role::Student);
    let outcome = store::insert_account(
        &pool,
        email,
        request.first_name.trim(),
        request.last_name.trim(),
        &password_hash,
        role,
        &enrollment.secret,
    )
    .await;

    match outcome {
        Ok(InsertOutcome::Created(user_id)) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "User created successfully. Please scan the QR code to set up 2FA."
                    .to_string(),
                user_id,
                secret: enrollment.secret,
                otpauth_url: enrollment.otpauth_url,
                qr_code: enrollment.qr_code,
            }),
        )
            .into_response(),
        Ok(InsertOutcome::Conflict) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "errors": ["The email address you entered already exists."],
            })),
        )
            .into_response(),
        Err(err) => {
            error!("registration failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}
