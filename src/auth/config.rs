use bcrypt::DEFAULT_COST;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 3600;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_TOTP_ISSUER: &str = "Aula";

/// Tunables for the authentication core.
///
/// The session lifetime is fixed at one hour by default; reset tokens live
/// for fifteen minutes. Both are overridable for tests.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    bcrypt_cost: u32,
    session_ttl_seconds: i64,
    session_cookie_secure: bool,
    reset_token_ttl_seconds: i64,
    totp_issuer: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            bcrypt_cost: DEFAULT_COST,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            totp_issuer: DEFAULT_TOTP_ISSUER.to_string(),
        }
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_totp_issuer(mut self, issuer: String) -> Self {
        self.totp_issuer = issuer;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        assert_eq!(config.frontend_base_url(), "http://localhost:3000");
        assert_eq!(config.bcrypt_cost(), DEFAULT_COST);
        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.reset_token_ttl_seconds(), 900);
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn builders_override() {
        let config = AuthConfig::new("http://localhost:3000".to_string())
            .with_bcrypt_cost(4)
            .with_session_cookie_secure(true)
            .with_reset_token_ttl_seconds(60)
            .with_totp_issuer("Campus".to_string());
        assert_eq!(config.bcrypt_cost(), 4);
        assert!(config.session_cookie_secure());
        assert_eq!(config.reset_token_ttl_seconds(), 60);
        assert_eq!(config.totp_issuer(), "Campus");
    }
}
