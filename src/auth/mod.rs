//! Authentication core.
//!
//! This module owns everything security-relevant about sign-in:
//!
//! - [`password`]: bcrypt hashing and verification.
//! - [`lockout`]: the progressive lock schedule for failed attempts.
//! - [`authenticator`]: primary-credential checks with persisted lockout
//!   state, serialized per account through a row lock.
//! - [`totp`] / [`two_factor`]: TOTP enrollment and the second login step.
//! - [`session`]: stateless signed session tokens and their cookie form.
//! - [`reset`]: single-use, time-boxed password-reset tokens.
//! - [`store`]: the persistence collaborator consumed by the above.
//!
//! External responses deliberately collapse distinct internal causes:
//! unknown email and wrong password, or tampered and expired sessions, are
//! indistinguishable to clients. See [`error::AuthError`].

pub mod authenticator;
pub mod config;
pub mod error;
pub mod lockout;
pub mod models;
pub mod password;
pub mod reset;
pub mod session;
pub mod store;
pub mod totp;
pub mod two_factor;

pub use authenticator::authenticate_primary;
pub use config::AuthConfig;
pub use error::AuthError;
pub use models::{Account, AccountSummary, Role};
pub use password::PasswordHasher;
pub use session::{SessionClaims, SessionKeys};
pub use totp::TotpProvider;
pub use two_factor::{second_factor, SecondFactorOutcome};
