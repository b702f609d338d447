//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`UserRepository`], [`PasswordHasher`]) are implemented by
//! outbound adapters. Driving ports ([`LoginService`],
//! [`RegistrationService`], [`UserProfileQuery`], [`UserProfileCommand`])
//! are what inbound adapters call; the domain `CredentialGateway` implements
//! all of them.

mod macros;
pub(crate) use macros::define_port_error;

mod login_service;
mod password_hasher;
mod registration_service;
mod user_profile_command;
mod user_profile_query;
mod user_repository;

pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHashingError};
#[cfg(test)]
pub use registration_service::MockRegistrationService;
pub use registration_service::RegistrationService;
#[cfg(test)]
pub use user_profile_command::MockUserProfileCommand;
pub use user_profile_command::UserProfileCommand;
#[cfg(test)]
pub use user_profile_query::MockUserProfileQuery;
pub use user_profile_query::UserProfileQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
