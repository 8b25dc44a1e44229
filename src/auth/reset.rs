//! Single-use, time-boxed password reset tokens.
//!
//! The raw token only ever travels in the reset link; the database stores a
//! SHA-256 hash. Tokens expire after fifteen minutes and are consumed
//! atomically, so replaying a redeemed token always fails.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{debug, info};

use super::{
    config::AuthConfig,
    error::AuthError,
    password::{self, PasswordHasher},
    store,
};

pub const RESET_EMAIL_TEMPLATE: &str = "reset_password";

/// Create a new reset token.
///
/// # Errors
/// Returns an error if the system RNG fails.
pub fn generate_reset_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a reset token so raw values never touch the database.
#[must_use]
pub fn hash_reset_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn build_reset_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/reset-password?token={token}")
}

/// Handle a forgot-password request.
///
/// Unknown emails are a silent no-op so the endpoint cannot be used to
/// probe for accounts; callers report the same success either way. On a
/// match, the token row and the outbound email are committed together, and
/// delivery happens later from the outbox, so a mail failure cannot change
/// the visible outcome.
///
/// # Errors
/// Returns an error only for persistence failures.
pub async fn request(pool: &PgPool, config: &AuthConfig, email: &str) -> Result<()> {
    let Some(account) = store::find_account_by_email(pool, email).await? else {
        debug!("reset requested for unknown email");
        return Ok(());
    };

    let token = generate_reset_token()?;
    let token_hash = hash_reset_token(&token);
    let reset_url = build_reset_url(config.frontend_base_url(), &token);
    let payload = serde_json::to_string(&json!({
        "email": account.email,
        "reset_url": reset_url,
    }))
    .context("failed to serialize reset email payload")?;

    let mut tx = pool
        .begin()
        .await
        .context("begin reset-request transaction")?;
    store::insert_reset_token(
        &mut tx,
        account.id,
        &token_hash,
        config.reset_token_ttl_seconds(),
    )
    .await?;
    store::enqueue_email(&mut tx, &account.email, RESET_EMAIL_TEMPLATE, &payload).await?;
    tx.commit()
        .await
        .context("commit reset-request transaction")?;

    info!(account_id = %account.id, "reset token issued");
    Ok(())
}

/// Redeem a reset token and store the new password.
///
/// The new password is validated before any state changes. Consumption and
/// the hash update commit together; unknown, expired, and already-used
/// tokens all collapse to `InvalidOrExpiredToken`.
///
/// # Errors
/// `Validation` for a bad password shape, `InvalidOrExpiredToken` for an
/// unusable token, `Internal` for persistence failures.
pub async fn redeem(
    pool: &PgPool,
    hasher: &PasswordHasher,
    token: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    password::validate_length(new_password).map_err(|msg| AuthError::Validation(vec![msg]))?;

    let token_hash = hash_reset_token(token.trim());
    let mut tx = pool
        .begin()
        .await
        .context("begin reset-redeem transaction")?;
    let Some(account_id) = store::consume_reset_token(&mut tx, &token_hash).await? else {
        return Err(AuthError::InvalidOrExpiredToken);
    };

    let password_hash = hasher.hash(new_password)?;
    store::set_password_hash(&mut tx, account_id, &password_hash).await?;
    tx.commit()
        .await
        .context("commit reset-redeem transaction")?;

    info!(%account_id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_enough_entropy() -> Result<()> {
        let token = generate_reset_token()?;
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .expect("token should be base64url");
        assert_eq!(decoded.len(), 32);
        Ok(())
    }

    #[test]
    fn tokens_are_unique() -> Result<()> {
        assert_ne!(generate_reset_token()?, generate_reset_token()?);
        Ok(())
    }

    #[test]
    fn hash_is_stable_and_discriminating() {
        let first = hash_reset_token("token");
        let second = hash_reset_token("token");
        let different = hash_reset_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn reset_url_trims_trailing_slash() {
        let url = build_reset_url("http://localhost:3000/", "tok");
        assert_eq!(url, "http://localhost:3000/reset-password?token=tok");
    }
}
