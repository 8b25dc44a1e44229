//! The second authentication step.
//!
//! Reached only after the primary credentials pass. Accounts without an
//! enrolled secret go straight to session issuance; enrolled accounts must
//! present a valid TOTP code first. Failed codes are deliberately not
//! counted toward the primary lockout.

use super::{
    error::AuthError,
    models::Account,
    session::SessionKeys,
    totp::TotpProvider,
};

#[derive(Debug)]
pub enum SecondFactorOutcome {
    /// Login complete; the signed session token is ready to set as a cookie.
    SessionIssued(String),
    /// The account has an enrolled secret and no code was supplied. Not a
    /// failure: the client should prompt for a code. No session yet.
    SecondFactorRequired,
}

/// Run the second step for an account whose primary credentials already
/// checked out.
///
/// # Errors
/// Returns `InvalidSecondFactor` for a wrong code and `Internal` if the
/// stored secret cannot be decoded or signing fails.
pub fn second_factor(
    keys: &SessionKeys,
    totp: &TotpProvider,
    account: &Account,
    code: Option<&str>,
) -> Result<SecondFactorOutcome, AuthError> {
    let Some(secret) = account.totp_secret.as_deref() else {
        let token = keys.issue(account.id, &account.email, true)?;
        return Ok(SecondFactorOutcome::SessionIssued(token));
    };

    let Some(code) = code else {
        return Ok(SecondFactorOutcome::SecondFactorRequired);
    };

    if !totp.verify(secret, code.trim())? {
        return Err(AuthError::InvalidSecondFactor);
    }

    let token = keys.issue(account.id, &account.email, true)?;
    Ok(SecondFactorOutcome::SessionIssued(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use secrecy::SecretString;
    use uuid::Uuid;

    fn keys() -> SessionKeys {
        SessionKeys::new(&SecretString::from("test-secret".to_string()))
    }

    fn provider() -> TotpProvider {
        TotpProvider::new("Aula".to_string())
    }

    fn account(totp_secret: Option<String>) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "joe@smith.com".to_string(),
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
            role: Role::Student,
            failed_logins: 0,
            lock_until: None,
            totp_secret,
        }
    }

    #[test]
    fn unenrolled_account_passes_through() -> Result<(), AuthError> {
        let keys = keys();
        let account = account(None);
        let outcome = second_factor(&keys, &provider(), &account, None)?;
        let SecondFactorOutcome::SessionIssued(token) = outcome else {
            panic!("expected a session");
        };
        let claims = keys.verify(&token)?;
        assert_eq!(claims.sub, account.id);
        assert!(claims.mfa);
        Ok(())
    }

    #[test]
    fn enrolled_without_code_prompts() -> Result<(), AuthError> {
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com").map_err(AuthError::Internal)?;
        let account = account(Some(enrollment.secret));
        let outcome = second_factor(&keys(), &provider, &account, None)?;
        assert!(matches!(outcome, SecondFactorOutcome::SecondFactorRequired));
        Ok(())
    }

    #[test]
    fn valid_code_issues_session() -> Result<(), AuthError> {
        let keys = keys();
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com").map_err(AuthError::Internal)?;
        let code = provider
            .generate_current(&enrollment.secret)
            .map_err(AuthError::Internal)?;
        let account = account(Some(enrollment.secret));
        let outcome = second_factor(&keys, &provider, &account, Some(code.as_str()))?;
        let SecondFactorOutcome::SessionIssued(token) = outcome else {
            panic!("expected a session");
        };
        let claims = keys.verify(&token)?;
        assert_eq!(claims.email, "joe@smith.com");
        assert!(claims.mfa);
        Ok(())
    }

    #[test]
    fn wrong_code_rejected_without_session() {
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com").expect("enroll");
        let account = account(Some(enrollment.secret));
        let result = second_factor(&keys(), &provider, &account, Some("000000"));
        assert!(matches!(result, Err(AuthError::InvalidSecondFactor)));
    }
}
