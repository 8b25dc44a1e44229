//! Primary-credential verification with progressive lockout.
//!
//! The read-check-write sequence runs inside one transaction holding a row
//! lock on the account, so concurrent attempts against the same account
//! cannot lose counter updates. Attempts against different accounts only
//! contend on their own rows.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use super::{
    error::AuthError,
    lockout,
    models::Account,
    password::PasswordHasher,
    store,
};

/// Whole minutes until `until`, rounded up.
fn remaining_minutes(now: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    let millis = (until - now).num_milliseconds().max(0);
    (millis + 59_999) / 60_000
}

/// Check `email`/`password` and persist the resulting lockout state before
/// returning.
///
/// Outcomes:
/// - unknown email and wrong password both yield `InvalidCredentials`;
/// - an active lock yields `AccountLocked` without touching the hash (and
///   without resetting the counter, even for a correct password);
/// - a correct password clears the counter and the lock;
/// - a wrong password increments the counter and, from the fifth failure
///   on, sets `lock_until` per the lockout schedule.
///
/// # Errors
/// Returns `AuthError::Internal` for persistence failures; those are not
/// retried here.
pub async fn authenticate_primary(
    pool: &PgPool,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<Account, AuthError> {
    let mut tx = pool.begin().await.context("begin login transaction")?;

    let Some(account) = store::lock_account_by_email(&mut tx, email).await? else {
        debug!("login attempt for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let now = Utc::now();
    if let Some(until) = account.lock_until {
        if until > now {
            // No hash work while locked; the counter must not reset early.
            return Err(AuthError::AccountLocked {
                until,
                remaining_minutes: remaining_minutes(now, until),
            });
        }
    }

    if hasher.verify(password, &account.password_hash)? {
        store::record_login_success(&mut tx, account.id).await?;
        tx.commit().await.context("commit login success")?;
        debug!(account_id = %account.id, "primary credentials accepted");
        return Ok(Account {
            failed_logins: 0,
            lock_until: None,
            ..account
        });
    }

    let attempts = account.failed_logins.saturating_add(1);
    let lock = lockout::lock_duration(attempts);
    let lock_until = (lock > Duration::zero()).then(|| now + lock);
    store::record_login_failure(&mut tx, account.id, attempts, lock_until).await?;
    tx.commit().await.context("commit login failure")?;

    if lock_until.is_some() {
        warn!(
            account_id = %account.id,
            attempts,
            lock_minutes = lock.num_minutes(),
            "account locked after repeated failures"
        );
    }
    Err(AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_minutes_rounds_up() {
        let now = Utc::now();
        assert_eq!(remaining_minutes(now, now + Duration::minutes(5)), 5);
        assert_eq!(
            remaining_minutes(now, now + Duration::minutes(4) + Duration::seconds(1)),
            5
        );
        assert_eq!(remaining_minutes(now, now + Duration::milliseconds(1)), 1);
        assert_eq!(remaining_minutes(now, now), 0);
        // Already past: clamped, never negative.
        assert_eq!(remaining_minutes(now, now - Duration::minutes(3)), 0);
    }
}
