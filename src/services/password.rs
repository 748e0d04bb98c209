//! Password policy and Argon2id hashing.
//!
//! Hashing and verification are CPU-bound and always run on the blocking pool.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::{Arc, OnceLock};
use tokio::task;

use crate::config::SecurityConfig;

/// Human-readable statement of [`is_valid`].
pub const POLICY_MESSAGE: &str = "password must be at least 8 characters long and contain a letter, a digit and an uppercase letter";

/// True iff the password has at least 8 characters, a letter, a digit and an
/// uppercase letter.
#[must_use]
pub fn is_valid(password: &str) -> bool {
    let mut has_letter = false;
    let mut has_digit = false;
    let mut has_upper = false;

    for c in password.chars() {
        has_letter |= c.is_alphabetic();
        has_digit |= c.is_numeric();
        has_upper |= c.is_uppercase();
    }

    password.chars().count() >= 8 && has_letter && has_digit && has_upper
}

/// Salted Argon2id hasher configured from [`SecurityConfig`].
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway password, verified against when the account does
    /// not exist so both login failure paths cost the same.
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self {
            params,
            dummy_hash: Arc::new(OnceLock::new()),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let params = self.params.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .context("Password hashing task panicked")?
    }

    /// Constant-time comparison of `password` against a stored PHC string.
    pub async fn verify(&self, password_hash: &str, password: &str) -> Result<bool> {
        let password_hash = password_hash.to_string();
        let password = password.to_string();

        task::spawn_blocking(move || verify_with(&password_hash, &password))
            .await
            .context("Password verification task panicked")?
    }

    /// Burns one verification against the dummy hash. Always yields `false`.
    pub async fn verify_dummy(&self, password: &str) -> Result<bool> {
        let params = self.params.clone();
        let dummy = Arc::clone(&self.dummy_hash);
        let password = password.to_string();

        task::spawn_blocking(move || {
            let hash = if let Some(hash) = dummy.get() {
                hash.clone()
            } else {
                let fresh = hash_with(&params, "kitchen-nerd-dummy-Passw0rd")?;
                dummy.get_or_init(|| fresh).clone()
            };
            verify_with(&hash, &password).map(|_| false)
        })
        .await
        .context("Password verification task panicked")?
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_with(password_hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    // Parameters are read from the PHC string, so the default instance can
    // verify hashes produced with any configured cost.
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
