use std::sync::{Arc, OnceLock};

use tracing::error;

use crate::error::CredentialError;

/// Hard input limit of bcrypt. Longer passwords are rejected, never truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

const DUMMY_PASSWORD: &str = "chirpy-timing-equalizer";

/// bcrypt hashing with a fixed work factor.
///
/// Every hash carries its own salt and cost, so hashes made with an older
/// cost keep verifying after the configured cost changes.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    cost: u32,
    dummy_hash: Arc<OnceLock<String>>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(CredentialError::PasswordTooLong(password.len()));
        }
        bcrypt::hash(password, self.cost).map_err(|e| CredentialError::HashingFailure(e.to_string()))
    }

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unusable.
    pub fn verify(&self, hash: &str, password: &str) -> Result<bool, CredentialError> {
        // A longer input can never have been hashed here.
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(password, hash).map_err(|e| CredentialError::MalformedHash(e.to_string()))
    }

    /// Spends one verification's worth of work without a stored hash.
    pub fn verify_dummy(&self, password: &str) {
        if let Some(hash) = self.dummy_hash() {
            let _ = bcrypt::verify(password, hash);
        }
    }

    fn dummy_hash(&self) -> Option<&str> {
        if let Some(hash) = self.dummy_hash.get() {
            return Some(hash.as_str());
        }
        match bcrypt::hash(DUMMY_PASSWORD, self.cost) {
            Ok(hash) => Some(self.dummy_hash.get_or_init(|| hash).as_str()),
            Err(e) => {
                // not cached, so the next call retries
                error!("Failed to build dummy hash at cost {}: {}", self.cost, e);
                None
            }
        }
    }
}
