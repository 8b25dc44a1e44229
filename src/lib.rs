//! # Aula (Course Catalog API)
//!
//! `aula` is the backend of a course-catalog application with teacher and
//! student accounts. Course CRUD is thin plumbing; the interesting part is
//! the authentication core in [`auth`]:
//!
//! ## Authentication
//!
//! Primary credentials are bcrypt-hashed passwords. Failed attempts feed a
//! progressive lockout schedule (up to a 3 hour cap) that is enforced and
//! persisted before any response is produced.
//!
//! ## Two-factor
//!
//! Every account is provisioned with a TOTP secret at registration. When a
//! secret is enrolled, login becomes a two-step exchange: primary
//! credentials first, then a 6-digit time-based code (one 30-second step of
//! clock skew is tolerated). Codes that fail the second step never count
//! toward the primary lockout counter.
//!
//! ## Sessions
//!
//! Sessions are stateless signed tokens (1 hour lifetime) delivered in an
//! `HttpOnly; SameSite=Strict` cookie. There is no server-side session
//! table, so revocation before expiry is not supported.
//!
//! ## Password reset
//!
//! Reset tokens are random 32-byte values stored only as SHA-256 hashes,
//! expire after 15 minutes, and are consumed atomically on first use.
//! Reset requests always report success to avoid account enumeration;
//! delivery goes through a transactional email outbox.

pub mod auth;
pub mod aula;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
