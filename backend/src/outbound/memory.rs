//! In-process `UserRepository` used when no database is configured and by
//! end-to-end tests.
//!
//! Rows live for the lifetime of the process. Every mutation holds the write
//! lock across the uniqueness check and the write, so the email constraint
//! holds under concurrent registrations just as it does in PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, PasswordHash, ProfileChanges, User, UserId};

#[derive(Default)]
struct Rows {
    by_id: HashMap<UserId, User>,
    by_email: HashMap<EmailAddress, UserId>,
}

/// Volatile user store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: RwLock<Rows>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.rows.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.write().await;
        if rows.by_email.contains_key(user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        if rows.by_id.contains_key(user.id()) {
            return Err(UserPersistenceError::query(format!(
                "user {} already exists",
                user.id()
            )));
        }
        rows.by_email.insert(user.email().clone(), user.id().clone());
        rows.by_id.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.rows.read().await.by_id.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let rows = self.rows.read().await;
        Ok(rows
            .by_email
            .get(email)
            .and_then(|id| rows.by_id.get(id))
            .cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError> {
        let mut rows = self.rows.write().await;
        let Some(current) = rows.by_id.get(id).cloned() else {
            return Err(UserPersistenceError::not_found(id.as_ref()));
        };

        let mut updated = current;
        if let Some(email) = changes.email() {
            if email != updated.email() {
                if rows.by_email.contains_key(email) {
                    return Err(UserPersistenceError::duplicate_email(email.as_ref()));
                }
                rows.by_email.remove(updated.email());
                rows.by_email.insert(email.clone(), id.clone());
                updated = updated.with_email(email.clone());
            }
        }
        if let Some(display_name) = changes.display_name() {
            updated = updated.with_display_name(display_name.clone());
        }
        rows.by_id.insert(id.clone(), updated.clone());
        Ok(updated)
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.by_id.get_mut(id) else {
            return Err(UserPersistenceError::not_found(id.as_ref()));
        };
        *row = row.clone().with_password_hash(hash.clone());
        Ok(())
    }

    async fn email_taken(
        &self,
        email: &EmailAddress,
        excluding: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        let rows = self.rows.read().await;
        Ok(rows
            .by_email
            .get(email)
            .is_some_and(|owner| Some(owner) != excluding.as_ref()))
    }
}
