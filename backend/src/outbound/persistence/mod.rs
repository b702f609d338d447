//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the user store port backed by PostgreSQL via
//! Diesel, with async support through `diesel-async` and `bb8` pooling.
//!
//! - Repository implementations only translate between Diesel rows and
//!   domain types.
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Database errors are mapped to `UserPersistenceError` variants.
//!
//! # Example
//!
//! ```no_run
//! use gateway::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/gateway")).await?;
//! let repo = DieselUserRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, apply_migrations, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
