//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users.
    ///
    /// `email` carries the `users_email_key` unique constraint; values are
    /// stored lower-cased by the domain.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Profile name (max 255 characters).
        display_name -> Varchar,
        /// Login email (max 255 characters, unique).
        email -> Varchar,
        /// Argon2 hash in PHC string format.
        password_hash -> Text,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp, set by the repository on update.
        updated_at -> Timestamptz,
    }
}
