//! Database helpers for accounts, reset tokens, and the email outbox.
//!
//! The schema these queries assume lives in `sql/schema.sql`. Email
//! uniqueness is enforced case-insensitively by the store (unique index on
//! `LOWER(email)`); lookups match the stored value exactly.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use tracing::Instrument;
use uuid::Uuid;

use super::models::{Account, Role};

const ACCOUNT_COLUMNS: &str = "id, email, first_name, last_name, password_hash, role, \
     failed_logins, lock_until, totp_secret";

/// Outcome when inserting a new account.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(Uuid),
    /// The email already exists (case-insensitively).
    Conflict,
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let role: String = row.get("role");
    let role = role.parse::<Role>().map_err(anyhow::Error::msg)?;
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        password_hash: row.get("password_hash"),
        role,
        failed_logins: row.get("failed_logins"),
        lock_until: row.get("lock_until"),
        totp_secret: row.get("totp_secret"),
    })
}

pub async fn find_account_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;
    row.as_ref().map(account_from_row).transpose()
}

pub async fn find_account_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;
    row.as_ref().map(account_from_row).transpose()
}

/// Row-locked read used by the login transaction so concurrent attempts
/// against the same account serialize their counter updates.
pub(crate) async fn lock_account_by_email(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 FOR UPDATE");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to lock account row")?;
    row.as_ref().map(account_from_row).transpose()
}

/// A successful primary check always clears the failure state.
pub(crate) async fn record_login_success(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET failed_logins = 0,
            lock_until = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to clear login failure state")?;
    Ok(())
}

pub(crate) async fn record_login_failure(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    failed_logins: i32,
    lock_until: Option<DateTime<Utc>>,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET failed_logins = $2,
            lock_until = $3,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(failed_logins)
        .bind(lock_until)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to record login failure")?;
    Ok(())
}

pub async fn insert_account(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    password_hash: &str,
    role: Role,
    totp_secret: &str,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO accounts
            (email, first_name, last_name, password_hash, role, totp_secret)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(totp_secret)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub async fn update_profile(
    pool: &PgPool,
    account_id: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(first_name)
        .bind(last_name)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update profile")?;
    Ok(())
}

pub async fn update_password(pool: &PgPool, account_id: Uuid, password_hash: &str) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET password_hash = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;
    Ok(())
}

pub(crate) async fn insert_reset_token(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO password_reset_tokens (account_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert reset token")?;
    Ok(())
}

/// Atomically consume a reset token: the single `UPDATE ... RETURNING` only
/// matches rows that are unused and unexpired, so a second redemption (or a
/// late one) finds nothing.
pub(crate) async fn consume_reset_token(
    tx: &mut Transaction<'_, Postgres>,
    token_hash: &[u8],
) -> Result<Option<Uuid>> {
    let query = r"
        UPDATE password_reset_tokens
        SET used_at = NOW()
        WHERE token_hash = $1
          AND used_at IS NULL
          AND expires_at > NOW()
        RETURNING account_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to consume reset token")?;
    Ok(row.map(|row| row.get("account_id")))
}

pub(crate) async fn set_password_hash(
    tx: &mut Transaction<'_, Postgres>,
    account_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET password_hash = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(password_hash)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to store new password hash")?;
    Ok(())
}

/// Enqueue an outbound email in the same transaction as the state change
/// that triggered it, so a delivery failure can never surface to the caller.
pub(crate) async fn enqueue_email(
    tx: &mut Transaction<'_, Postgres>,
    to_email: &str,
    template: &str,
    payload_json: &str,
) -> Result<()> {
    let query = r"
        INSERT INTO email_outbox (to_email, template, payload_json)
        VALUES ($1, $2, $3::jsonb)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(to_email)
        .bind(template)
        .bind(payload_json)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to enqueue outbox email")?;
    Ok(())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn insert_outcome_debug_names() {
        assert!(format!("{:?}", InsertOutcome::Created(Uuid::nil())).starts_with("Created"));
        assert_eq!(format!("{:?}", InsertOutcome::Conflict), "Conflict");
    }
}
