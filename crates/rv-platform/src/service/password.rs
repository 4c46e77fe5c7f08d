//! Password Service
//!
//! Argon2id hashing with fixed parameters. The cost is not configurable at
//! runtime.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{PlatformError, Result};

/// Minimal password rules applied at registration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
    /// Verified against when the identifier is unknown, so both failure
    /// paths cost one Argon2 verification.
    dummy_hash: String,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}

impl PasswordService {
    pub fn new(policy: PasswordPolicy) -> Self {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"revalidation-dummy-password", &salt)
            .map(|hash| hash.to_string())
            .unwrap_or_default();

        Self {
            argon2,
            policy,
            dummy_hash,
        }
    }

    pub fn validate(&self, plaintext: &str) -> Result<()> {
        let len = plaintext.chars().count();
        if len < self.policy.min_length {
            return Err(PlatformError::validation(format!(
                "Password must be at least {} characters",
                self.policy.min_length
            )));
        }
        if len > self.policy.max_length {
            return Err(PlatformError::validation(format!(
                "Password must be at most {} characters",
                self.policy.max_length
            )));
        }
        Ok(())
    }

    /// Hash a plaintext password into a PHC string with a fresh salt.
    pub fn hash_password(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PlatformError::Internal {
                message: format!("Password hashing failed: {}", e),
            })
    }

    pub fn verify_password(&self, plaintext: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }

    /// Burn one verification for an unknown identifier. Always false.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        let _ = self.verify_password(plaintext, &self.dummy_hash);
        false
    }
}
