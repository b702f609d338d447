//! Argon2id `PasswordHasher` adapter.
//!
//! Hashes are PHC strings carrying their own salt and parameters, so
//! verification keeps working after the configured cost changes. Both
//! operations are CPU-bound and run on the blocking thread pool.

use argon2::password_hash::{self, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHasher, PasswordHashingError};

const SALT_LEN: usize = 16;

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for Argon2PasswordHasher {
    /// Library defaults: 19 MiB memory, 2 iterations, 1 lane.
    fn default() -> Self {
        Self::from_params(Params::default())
    }
}

impl Argon2PasswordHasher {
    /// Build a hasher with explicit cost parameters.
    ///
    /// # Errors
    ///
    /// Returns `PasswordHashingError::Hash` when Argon2 rejects the
    /// combination (for example memory below 8 KiB per lane).
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordHashingError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|err| {
            PasswordHashingError::hash(format!("invalid argon2 parameters: {err}"))
        })?;
        Ok(Self::from_params(params))
    }

    fn from_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    fn hash_blocking(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordHashingError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|err| PasswordHashingError::hash(format!("salt generation failed: {err}")))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|err| PasswordHashingError::hash(format!("salt encoding failed: {err}")))?;
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordHashingError::hash(err.to_string()))
    }

    fn verify_blocking(
        argon2: &Argon2<'_>,
        password: &str,
        encoded: &str,
    ) -> Result<bool, PasswordHashingError> {
        let parsed = password_hash::PasswordHash::new(encoded)
            .map_err(|err| PasswordHashingError::hash(format!("stored hash is malformed: {err}")))?;
        match argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordHashingError::hash(err.to_string())),
        }
    }
}

fn join_error(err: tokio::task::JoinError) -> PasswordHashingError {
    PasswordHashingError::unavailable(err.to_string())
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashingError> {
        let argon2 = self.argon2.clone();
        let password = Zeroizing::new(password.to_owned());
        let encoded = tokio::task::spawn_blocking(move || Self::hash_blocking(&argon2, &password))
            .await
            .map_err(join_error)??;
        PasswordHash::new(encoded).map_err(|err| PasswordHashingError::hash(err.to_string()))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashingError> {
        let argon2 = self.argon2.clone();
        let password = Zeroizing::new(password.to_owned());
        let encoded = hash.as_str().to_owned();
        tokio::task::spawn_blocking(move || Self::verify_blocking(&argon2, &password, &encoded))
            .await
            .map_err(join_error)?
    }
}
