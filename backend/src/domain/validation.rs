//! Per-field validation failures.
//!
//! Request constructors collect every offending field instead of stopping at
//! the first one, so a client can highlight all of them at once. The
//! collection converts into an [`Error`] with code `invalid_request` whose
//! details list the fields:
//!
//! ```json
//! { "fields": [ { "field": "email", "code": "invalid_email", "message": "..." } ] }
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::json;

use super::Error;

/// Machine-readable reason attached to a field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    /// Required value absent or blank.
    MissingField,
    /// Value exceeds the maximum length.
    TooLong,
    /// Value is shorter than the minimum length.
    TooShort,
    /// Value is not an email address.
    InvalidEmail,
    /// Email already belongs to another user.
    EmailTaken,
    /// Confirmation does not match the value it confirms.
    ConfirmationMismatch,
}

/// A single field failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    field: &'static str,
    code: FieldErrorCode,
    message: String,
}

impl FieldError {
    /// Build a field failure.
    pub fn new(field: &'static str, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }

    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Reason code.
    pub fn code(&self) -> FieldErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Ordered collection of field failures.
///
/// # Examples
/// ```
/// use gateway::domain::{FieldErrorCode, FieldErrors};
///
/// let mut errors = FieldErrors::default();
/// errors.push("email", FieldErrorCode::MissingField, "email is required");
/// let err = errors.into_result(()).expect_err("one failure recorded");
/// assert_eq!(err.field_errors()[0].field(), "email");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Wrap a single failure.
    pub fn single(field: &'static str, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, code, message)])
    }

    /// Record a failure.
    pub fn push(&mut self, field: &'static str, code: FieldErrorCode, message: impl Into<String>) {
        self.0.push(FieldError::new(field, code, message));
    }

    /// Record the outcome of a field check, returning the value on success.
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.0.push(error);
                None
            }
        }
    }

    /// Whether no failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded failures in insertion order.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|error| error.field).collect();
        write!(f, "validation failed for: {}", fields.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

impl From<FieldError> for FieldErrors {
    fn from(value: FieldError) -> Self {
        Self(vec![value])
    }
}

impl From<FieldErrors> for Error {
    fn from(value: FieldErrors) -> Self {
        Error::invalid_request("validation failed").with_details(json!({ "fields": value.0 }))
    }
}
