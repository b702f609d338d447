//! Domain primitives, request types, ports and the credential service.
//!
//! Purpose: define strongly typed entities and the rules that guard them,
//! independent of HTTP, sessions or storage. Adapters live in `inbound` and
//! `outbound` and talk to this module only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - FieldErrors: per-field validation failures, convertible into Error.
//! - User and its value types: the persisted credential record.
//! - LoginCredentials, Registration, ProfileChanges, PasswordChange:
//!   validated request payloads.
//! - CredentialGateway: the service implementing every driving port.

pub mod auth;
pub mod credential_gateway;
pub mod error;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::auth::{
    LoginCredentials, PASSWORD_MIN_LEN, PasswordChange, ProfileChanges, Registration,
};
pub use self::credential_gateway::CredentialGateway;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, EmailAddress, PasswordHash, User, UserId,
    UserValidationError,
};
pub use self::validation::{FieldError, FieldErrorCode, FieldErrors};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use gateway::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::unauthorized("login required"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
