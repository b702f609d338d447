//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Email uniqueness is enforced by the `users_email_key` constraint; a
//! violation on insert or update is reported as `DuplicateEmail` so two
//! racing registrations resolve to exactly one row.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{DisplayName, EmailAddress, PasswordHash, ProfileChanges, User, UserId};

use super::models::{NewUserRow, PasswordUpdate, ProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Name of the unique constraint on `users.email`.
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> UserPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

/// Map a failed insert or update, recognising the email unique constraint.
fn map_write_error(error: DieselError, email: &EmailAddress) -> UserPersistenceError {
    let email_conflict = matches!(
        &error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(EMAIL_UNIQUE_CONSTRAINT)
    );
    if email_conflict {
        return UserPersistenceError::duplicate_email(email.as_ref());
    }
    map_diesel_error(error)
}

/// Convert a database row into a domain user.
///
/// Rows that violate the domain invariants are reported as query failures
/// rather than silently repaired.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let corrupt = |field: &str, err: &dyn std::fmt::Display| {
        UserPersistenceError::query(format!("stored user {} has invalid {field}: {err}", row.id))
    };
    let display_name =
        DisplayName::new(&row.display_name).map_err(|err| corrupt("display_name", &err))?;
    let email = EmailAddress::new(&row.email).map_err(|err| corrupt("email", &err))?;
    let password_hash = PasswordHash::new(row.password_hash.as_str())
        .map_err(|err| corrupt("password_hash", &err))?;
    Ok(User::new(
        UserId::from_uuid(row.id),
        display_name,
        email,
        password_hash,
    ))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewUserRow {
            id: *user.id().as_uuid(),
            display_name: user.display_name().as_ref(),
            email: user.email().as_ref(),
            password_hash: user.password_hash().as_str(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_write_error(err, user.email()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        changes: &ProfileChanges,
    ) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = ProfileUpdate {
            display_name: changes.display_name().map(AsRef::as_ref),
            email: changes.email().map(AsRef::as_ref),
            updated_at: Utc::now(),
        };

        let row: Option<UserRow> = diesel::update(users::table.find(*id.as_uuid()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| match changes.email() {
                Some(email) => map_write_error(err, email),
                None => map_diesel_error(err),
            })?;

        match row {
            Some(row) => row_to_user(row),
            None => Err(UserPersistenceError::not_found(id.as_ref())),
        }
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = PasswordUpdate {
            password_hash: hash.as_str(),
            updated_at: Utc::now(),
        };

        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated == 0 {
            return Err(UserPersistenceError::not_found(id.as_ref()));
        }
        Ok(())
    }

    async fn email_taken(
        &self,
        email: &EmailAddress,
        excluding: Option<UserId>,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(users::id)
            .into_boxed();
        if let Some(id) = excluding {
            query = query.filter(users::id.ne(*id.as_uuid()));
        }

        let found: Option<Uuid> = query
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(found.is_some())
    }
}
