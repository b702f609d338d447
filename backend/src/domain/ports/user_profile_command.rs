//! Driving port for profile mutations.

use async_trait::async_trait;

use crate::domain::{Error, PasswordChange, ProfileChanges, User, UserId};

/// Domain use-case port for editing the current user's account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfileCommand: Send + Sync {
    /// Apply name and email changes, returning the updated user.
    ///
    /// The email uniqueness check ignores the caller's own row.
    async fn update_profile(
        &self,
        user_id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, Error>;

    /// Replace the password hash after verifying the current password.
    ///
    /// A wrong current password yields an `unauthorized` error naming the
    /// `current_password` field and leaves the stored hash untouched.
    async fn change_password(
        &self,
        user_id: &UserId,
        change: &PasswordChange,
    ) -> Result<(), Error>;
}
