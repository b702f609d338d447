//! Driven port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashingError {
        /// Hashing failed or the stored hash could not be parsed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The worker running the hash was lost.
        Unavailable { message: String } => "password hasher unavailable: {message}",
    }
}

/// Hash and verify passwords.
///
/// `verify` returns `Ok(false)` for a wrong password; errors are reserved for
/// hasher faults and corrupt stored hashes. Implementations must compare in
/// constant time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash of `password`.
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashingError>;

    /// Check `password` against a stored hash.
    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashingError>;
}
