//! Driving port for account registration.

use async_trait::async_trait;

use crate::domain::{Error, Registration, UserId};

/// Domain use-case port for creating accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Hash the password and persist a new user, returning its id.
    ///
    /// A taken email is reported as an `invalid_request` error naming the
    /// `email` field.
    async fn register(&self, registration: &Registration) -> Result<UserId, Error>;
}
