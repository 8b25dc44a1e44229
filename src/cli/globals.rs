use bcrypt::DEFAULT_COST;
use secrecy::SecretString;

/// Process-wide configuration resolved from CLI arguments and environment.
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Symmetric key for session-token signing; never logged.
    pub session_secret: SecretString,
    pub frontend_base_url: String,
    pub bcrypt_cost: u32,
    pub secure_cookies: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(session_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            session_secret,
            frontend_base_url,
            bcrypt_cost: DEFAULT_COST,
            secure_cookies: false,
        }
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            SecretString::from("s3cret".to_string()),
            "http://localhost:3000".to_string(),
        );
        assert_eq!(args.session_secret.expose_secret(), "s3cret");
        assert_eq!(args.frontend_base_url, "http://localhost:3000");
        assert_eq!(args.bcrypt_cost, DEFAULT_COST);
        assert!(!args.secure_cookies);
    }

    #[test]
    fn test_builders() {
        let args = GlobalArgs::new(
            SecretString::from("s3cret".to_string()),
            "http://localhost:3000".to_string(),
        )
        .with_bcrypt_cost(10)
        .with_secure_cookies(true);
        assert_eq!(args.bcrypt_cost, 10);
        assert!(args.secure_cookies);
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let args = GlobalArgs::new(
            SecretString::from("s3cret".to_string()),
            "http://localhost:3000".to_string(),
        );
        let debug = format!("{args:?}");
        assert!(!debug.contains("s3cret"));
    }
}
