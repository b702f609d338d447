//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL user store using Diesel ORM
//! - **memory**: in-process user store for development and tests
//! - **argon2_hasher**: Argon2id password hashing
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod argon2_hasher;
pub mod memory;
pub mod persistence;

pub use argon2_hasher::Argon2PasswordHasher;
pub use memory::InMemoryUserRepository;
