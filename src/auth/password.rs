//! Password hashing backed by bcrypt.
//!
//! Each hash embeds its own random salt and cost factor, so verification
//! needs no extra state. bcrypt compares full digests on verify; there is no
//! early exit on the first differing byte.

use anyhow::{Context, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 100;

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Cost is clamped to the range bcrypt accepts (4..=31).
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    /// # Errors
    /// Returns an error if bcrypt fails internally; the plaintext never
    /// appears in the error.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::hash(plaintext, self.cost).context("failed to hash password")
    }

    /// # Errors
    /// Returns an error only for a malformed stored hash; a plain mismatch
    /// is `Ok(false)`.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(plaintext, hash).context("failed to verify password")
    }
}

/// Shape check shared by registration, password change, and reset.
///
/// # Errors
/// Returns the user-facing message when the length is out of bounds.
pub fn validate_length(plaintext: &str) -> Result<(), String> {
    let length = plaintext.chars().count();
    if (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err("Your password should be between 8 and 100 characters.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the hashing tests fast.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn hash_then_verify_round_trip() -> Result<()> {
        let hasher = hasher();
        let hash = hasher.hash("correct horse battery staple")?;
        assert!(hasher.verify("correct horse battery staple", &hash)?);
        assert!(!hasher.verify("wrong password", &hash)?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let hasher = hasher();
        let first = hasher.hash("password123")?;
        let second = hasher.hash("password123")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = hasher();
        assert!(hasher.verify("anything", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(PasswordHasher::new(0).cost, 4);
        assert_eq!(PasswordHasher::new(99).cost, 31);
        assert_eq!(PasswordHasher::new(12).cost, 12);
    }

    #[test]
    fn length_bounds() {
        assert!(validate_length("1234567").is_err());
        assert!(validate_length("12345678").is_ok());
        assert!(validate_length(&"x".repeat(100)).is_ok());
        assert!(validate_length(&"x".repeat(101)).is_err());
    }
}
