//! Driven port for the user store.
//!
//! Email uniqueness belongs to the store: adapters must reject a second row
//! with the same email atomically and report it as
//! [`UserPersistenceError::DuplicateEmail`], even when a prior
//! [`UserRepository::email_taken`] check said the address was free.

use async_trait::async_trait;

use crate::domain::{EmailAddress, PasswordHash, ProfileChanges, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email already belongs to another row.
        DuplicateEmail { email: String } => "email already registered: {email}",
        /// The row to update does not exist.
        NotFound { id: String } => "user not found: {id}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Write only the fields present in `changes` and return the stored row.
    ///
    /// The password hash is never touched, so a concurrent password change
    /// survives a profile edit.
    async fn update_profile(
        &self,
        id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError>;

    /// Replace the password hash and nothing else.
    async fn set_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError>;

    /// Whether `email` belongs to a user other than `excluding`.
    async fn email_taken(
        &self,
        email: &EmailAddress,
        excluding: Option<UserId>,
    ) -> Result<bool, UserPersistenceError>;
}
