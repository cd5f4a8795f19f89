//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=...`), so the cost
//! parameters travel with each hash and verification keeps working after
//! the configured cost changes.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::core::config::AuthConfig;

/// Salted, memory-hard password hasher with a fixed cost
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("Invalid Argon2 parameters: {}", e))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt. Returns a PHC-format string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC string.
    ///
    /// `Ok(false)` on mismatch, `Err` only if the stored hash is malformed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {}", e))?;
        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    // Minimum cost keeps the suites fast
    PasswordHasher::new(1024, 1, 1).unwrap()
}
