//! Credential gateway service.
//!
//! Implements every driving port over a [`UserRepository`] and a
//! [`PasswordHasher`]. Each operation validates, then either mutates the
//! store once or rejects without side effects; nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    LoginService, PasswordHasher, PasswordHashingError, RegistrationService, UserPersistenceError,
    UserProfileCommand, UserProfileQuery, UserRepository,
};
use crate::domain::{
    EmailAddress, Error, FieldErrorCode, FieldErrors, LoginCredentials, PasswordChange,
    PasswordHash, ProfileChanges, Registration, User, UserId,
};

/// Plaintext behind the hash verified for unknown emails.
const DUMMY_PASSWORD: &str = "credential-gateway-timing-equaliser";

/// Service implementing login, registration and profile use-cases.
pub struct CredentialGateway<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    dummy_hash: OnceCell<PasswordHash>,
}

impl<R, H> CredentialGateway<R, H> {
    /// Create a gateway over the given store and hasher.
    pub fn new(users: Arc<R>, hasher: Arc<H>) -> Self {
        Self {
            users,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }
}

/// Generic wrong-credentials error flagged on `email`.
fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
        .with_details(json!({ "field": "email", "code": "invalid_credentials" }))
}

fn incorrect_current_password() -> Error {
    Error::unauthorized("current password is incorrect")
        .with_details(json!({ "field": "current_password", "code": "incorrect_password" }))
}

fn email_taken() -> Error {
    FieldErrors::single(
        "email",
        FieldErrorCode::EmailTaken,
        "email has already been taken",
    )
    .into()
}

fn map_persistence_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => {
            error!(%message, "user store unavailable");
            Error::service_unavailable(format!("user store unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            error!(%message, "user store query failed");
            Error::internal(format!("user store error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => email_taken(),
        UserPersistenceError::NotFound { .. } => Error::not_found("user not found"),
    }
}

fn map_hashing_error(err: PasswordHashingError) -> Error {
    error!(error = %err, "password hasher failed");
    match err {
        PasswordHashingError::Hash { message } => {
            Error::internal(format!("password hashing failed: {message}"))
        }
        PasswordHashingError::Unavailable { message } => {
            Error::service_unavailable(format!("password hasher unavailable: {message}"))
        }
    }
}

impl<R, H> CredentialGateway<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, Error> {
        self.hasher
            .verify(password, hash)
            .await
            .map_err(map_hashing_error)
    }

    async fn ensure_email_free(
        &self,
        email: &EmailAddress,
        excluding: Option<&UserId>,
    ) -> Result<(), Error> {
        let taken = self
            .users
            .email_taken(email, excluding.cloned())
            .await
            .map_err(map_persistence_error)?;
        if taken { Err(email_taken()) } else { Ok(()) }
    }

    /// Spend the cost of one verification so unknown emails take as long to
    /// reject as wrong passwords. Hasher faults here are not reported; the
    /// caller rejects the login either way.
    async fn verify_against_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
            .await;
        match dummy {
            Ok(hash) => {
                if let Err(err) = self.hasher.verify(password, hash).await {
                    debug!(error = %err, "dummy verification failed");
                }
            }
            Err(err) => debug!(error = %err, "dummy hash unavailable"),
        }
    }
}

#[async_trait]
impl<R, H> LoginService for CredentialGateway<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let found = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_persistence_error)?;

        let Some(user) = found else {
            self.verify_against_dummy(credentials.password()).await;
            warn!("login rejected");
            return Err(invalid_credentials());
        };

        if self
            .verify(credentials.password(), user.password_hash())
            .await?
        {
            info!(user_id = %user.id(), "login succeeded");
            Ok(user.id().clone())
        } else {
            warn!("login rejected");
            Err(invalid_credentials())
        }
    }
}

#[async_trait]
impl<R, H> RegistrationService for CredentialGateway<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, registration: &Registration) -> Result<UserId, Error> {
        self.ensure_email_free(registration.email(), None).await?;

        let password_hash = self
            .hasher
            .hash(registration.password())
            .await
            .map_err(map_hashing_error)?;
        let user = User::new(
            UserId::random(),
            registration.display_name().clone(),
            registration.email().clone(),
            password_hash,
        );

        // The store rejects a concurrent registration that passed the check
        // above; that surfaces as `DuplicateEmail` and maps to the same error.
        self.users
            .create(&user)
            .await
            .map_err(map_persistence_error)?;

        info!(user_id = %user.id(), "user registered");
        Ok(user.id().clone())
    }
}

#[async_trait]
impl<R, H> UserProfileQuery for CredentialGateway<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.load_user(user_id).await
    }
}

#[async_trait]
impl<R, H> UserProfileCommand for CredentialGateway<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, Error> {
        if changes.is_empty() {
            return self.load_user(user_id).await;
        }

        if let Some(email) = changes.email() {
            self.ensure_email_free(email, Some(user_id)).await?;
        }

        let updated = self
            .users
            .update_profile(user_id, changes)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %user_id, "profile updated");
        Ok(updated)
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        change: &PasswordChange,
    ) -> Result<(), Error> {
        let user = self.load_user(user_id).await?;

        if !self
            .verify(change.current_password(), user.password_hash())
            .await?
        {
            warn!(user_id = %user_id, "password change rejected");
            return Err(incorrect_current_password());
        }

        let password_hash = self
            .hasher
            .hash(change.new_password())
            .await
            .map_err(map_hashing_error)?;
        self.users
            .set_password_hash(user.id(), &password_hash)
            .await
            .map_err(map_persistence_error)?;

        info!(user_id = %user_id, "password changed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "credential_gateway_tests.rs"]
mod tests;
