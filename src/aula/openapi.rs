use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use super::handlers;
use crate::auth::{AccountSummary, Role};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "aula",
        description = "Course catalog API with progressive-lockout authentication and TOTP two-factor"
    ),
    paths(
        handlers::health::health,
        handlers::user_register::register,
        handlers::user_login::login,
        handlers::two_factor::login_second_factor,
        handlers::two_factor::verify_second_factor,
        handlers::user_me::current_user,
        handlers::user_me::update_user,
        handlers::password::forgot_password,
        handlers::password::reset_password,
    ),
    components(schemas(
        Role,
        AccountSummary,
        handlers::user_register::RegisterRequest,
        handlers::user_register::RegisterResponse,
        handlers::user_login::LoginRequest,
        handlers::user_login::SecondFactorPrompt,
        handlers::two_factor::SecondFactorRequest,
        handlers::two_factor::VerifyResponse,
        handlers::user_me::UpdateUserRequest,
        handlers::password::ForgotPasswordRequest,
        handlers::password::ResetPasswordRequest,
    )),
    tags(
        (name = "auth", description = "Login, second factor, sessions"),
        (name = "users", description = "Account management"),
        (name = "password", description = "Password reset flow"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_auth_routes() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|path| *path == "/api/users/login"));
        assert!(paths.iter().any(|path| *path == "/api/users/login/2fa"));
        assert!(paths.iter().any(|path| *path == "/api/password/forgot"));
        assert!(paths.iter().any(|path| *path == "/api/password/reset"));
        assert!(paths.iter().any(|path| *path == "/health"));
    }
}
