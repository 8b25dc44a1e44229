//! TOTP secret provisioning and verification (RFC 6238).
//!
//! Codes are 6 digits over 30 second steps (SHA-1), with a skew of one step
//! so a code from the immediately preceding or following window still
//! passes.

use anyhow::{anyhow, Result};
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// Everything the account owner needs to set up an authenticator app. The
/// raw secret is surfaced exactly once, at enrollment.
#[derive(Clone, Debug)]
pub struct TotpEnrollment {
    /// Base32 secret for manual entry; this is also what gets persisted.
    pub secret: String,
    /// `otpauth://` provisioning URI.
    pub otpauth_url: String,
    /// QR rendering of the URI as a `data:image/png;base64,...` URL.
    pub qr_code: String,
}

#[derive(Clone, Debug)]
pub struct TotpProvider {
    issuer: String,
}

impl TotpProvider {
    #[must_use]
    pub fn new(issuer: String) -> Self {
        Self { issuer }
    }

    /// Generate a fresh secret for an account. The secret has no expiry; it
    /// stays valid until replaced.
    ///
    /// # Errors
    /// Returns an error if secret generation or QR rendering fails.
    pub fn enroll(&self, email: &str) -> Result<TotpEnrollment> {
        let secret = Secret::generate_secret();
        let secret_base32 = secret.to_encoded().to_string();
        let totp = self.build(&secret_base32, email)?;

        let otpauth_url = totp.get_url();
        let qr = totp
            .get_qr_base64()
            .map_err(|err| anyhow!("QR generation error: {err}"))?;

        Ok(TotpEnrollment {
            secret: secret_base32,
            otpauth_url,
            qr_code: format!("data:image/png;base64,{qr}"),
        })
    }

    /// Check a code against a stored secret within the skew window.
    ///
    /// # Errors
    /// Returns an error for an undecodable stored secret; a wrong code is
    /// `Ok(false)`.
    pub fn verify(&self, secret_base32: &str, code: &str) -> Result<bool> {
        let totp = self.build(secret_base32, "")?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    fn build(&self, secret_base32: &str, account_name: &str) -> Result<TOTP> {
        let secret = Secret::Encoded(secret_base32.to_string());
        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP_SECONDS,
            secret
                .to_bytes()
                .map_err(|err| anyhow!("invalid TOTP secret: {err}"))?,
            Some(self.issuer.clone()),
            account_name.to_string(),
        )
        .map_err(|err| anyhow!("TOTP init error: {err}"))
    }

    /// Current code for a secret; only tests need to mint codes server-side.
    #[cfg(test)]
    pub(crate) fn generate_current(&self, secret_base32: &str) -> Result<String> {
        let totp = self.build(secret_base32, "")?;
        totp.generate_current()
            .map_err(|err| anyhow!("failed to generate code: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn provider() -> TotpProvider {
        TotpProvider::new("Aula".to_string())
    }

    fn now_unix() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs()
    }

    #[test]
    fn enroll_produces_scannable_material() -> Result<()> {
        let enrollment = provider().enroll("joe@smith.com")?;
        assert!(!enrollment.secret.is_empty());
        assert!(enrollment.otpauth_url.starts_with("otpauth://totp/"));
        assert!(enrollment.otpauth_url.contains("Aula"));
        assert!(enrollment.qr_code.starts_with("data:image/png;base64,"));
        Ok(())
    }

    #[test]
    fn current_code_verifies() -> Result<()> {
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com")?;
        let code = provider.generate_current(&enrollment.secret)?;
        assert!(provider.verify(&enrollment.secret, &code)?);
        Ok(())
    }

    #[test]
    fn wrong_code_fails() -> Result<()> {
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com")?;
        assert!(!provider.verify(&enrollment.secret, "000000")?);
        assert!(!provider.verify(&enrollment.secret, "12345")?);
        Ok(())
    }

    #[test]
    fn adjacent_steps_accepted_but_not_older() -> Result<()> {
        let provider = provider();
        let enrollment = provider.enroll("joe@smith.com")?;
        let totp = provider.build(&enrollment.secret, "")?;

        let now = now_unix();
        // One step of skew either side passes.
        assert!(totp.check(&totp.generate(now - STEP_SECONDS), now));
        assert!(totp.check(&totp.generate(now + STEP_SECONDS), now));
        // Three steps back is outside the window.
        assert!(!totp.check(&totp.generate(now - 3 * STEP_SECONDS), now));
        Ok(())
    }

    #[test]
    fn undecodable_secret_is_an_error() {
        assert!(provider().verify("!!!not-base32!!!", "123456").is_err());
    }
}
