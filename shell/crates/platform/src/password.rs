//! Password Hashing and Verification
//!
//! Argon2id hashing for the credential table of the mock auth backend,
//! with zeroization of clear text and a minimal length policy.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

// Argon2id cost for the in-memory table: m=4 MiB, t=1, p=1
const ARGON2_MEMORY_KIB: u32 = 4096;
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 1;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone`; debug output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Validate and wrap a password chosen by a user (registration, change)
    ///
    /// Unicode is normalized using NFKC before validation.
    pub fn new(raw: impl Into<String>) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.into().nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != ' ' && ch != '\t')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(Self(normalized))
    }

    /// Wrap a password presented at login without applying the policy
    ///
    /// Login must answer "invalid credentials" for a short password,
    /// never leak the policy.
    pub fn for_verification(raw: impl Into<String>) -> Self {
        Self(raw.into().nfkc().collect())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password using Argon2id
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            None,
        )
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from a PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash (constant time inside argon2)
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
