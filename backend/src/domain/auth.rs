//! Credential request types: login, registration, profile edits and password
//! changes.
//!
//! Inbound adapters hand raw optional strings to these constructors. Every
//! offending field is reported at once through [`FieldErrors`], so payload
//! parsing stays outside the domain while the rules live inside it.
//! Passwords are kept in [`Zeroizing`] buffers and are never trimmed.

use zeroize::Zeroizing;

use super::{
    DisplayName, EmailAddress, FieldError, FieldErrorCode, FieldErrors, UserValidationError,
};

/// Minimum length, in characters, of a new or current password.
pub const PASSWORD_MIN_LEN: usize = 8;

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, FieldError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => Ok(raw),
        _ => Err(FieldError::new(
            field,
            FieldErrorCode::MissingField,
            format!("{field} is required"),
        )),
    }
}

fn from_user_error(field: &'static str, error: UserValidationError) -> FieldError {
    FieldError::new(field, error.field_code(), error.to_string())
}

fn parse_display_name(field: &'static str, value: &str) -> Result<DisplayName, FieldError> {
    DisplayName::new(value).map_err(|err| from_user_error(field, err))
}

fn parse_email(field: &'static str, value: &str) -> Result<EmailAddress, FieldError> {
    EmailAddress::new(value).map_err(|err| from_user_error(field, err))
}

fn parse_password(
    field: &'static str,
    value: Option<&str>,
) -> Result<Zeroizing<String>, FieldError> {
    let raw = required(field, value)?;
    if raw.chars().count() < PASSWORD_MIN_LEN {
        return Err(FieldError::new(
            field,
            FieldErrorCode::TooShort,
            format!("{field} must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(Zeroizing::new(raw.to_owned()))
}

/// Validated login credentials.
///
/// Only presence is checked for the password: accounts created before a
/// length rule existed must still be able to log in.
///
/// # Examples
/// ```
/// use gateway::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(Some("Ann@x.com"), Some("password1")).unwrap();
/// assert_eq!(creds.email().as_ref(), "ann@x.com");
/// assert_eq!(creds.password(), "password1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw form values.
    pub fn try_from_parts(
        email_value: Option<&str>,
        password_value: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email =
            errors.check(required("email", email_value).and_then(|raw| parse_email("email", raw)));
        let password = errors.check(
            required("password", password_value).map(|raw| Zeroizing::new(raw.to_owned())),
        );

        match (email, password) {
            (Some(email), Some(password)) => Ok(Self { email, password }),
            _ => Err(errors),
        }
    }

    /// Normalised email used for the user lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password exactly as submitted.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    display_name: DisplayName,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl Registration {
    /// Construct a registration from raw form values.
    pub fn try_from_parts(
        name_value: Option<&str>,
        email_value: Option<&str>,
        password_value: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let display_name = errors.check(
            required("name", name_value).and_then(|raw| parse_display_name("name", raw)),
        );
        let email =
            errors.check(required("email", email_value).and_then(|raw| parse_email("email", raw)));
        let password = errors.check(parse_password("password", password_value));

        match (display_name, email, password) {
            (Some(display_name), Some(email), Some(password)) => Ok(Self {
                display_name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated profile edit.
///
/// Absent fields are left untouched. A field that is submitted must satisfy
/// the same rules as at registration, so an empty `name` is rejected rather
/// than treated as "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    display_name: Option<DisplayName>,
    email: Option<EmailAddress>,
}

impl ProfileChanges {
    /// Construct a profile edit from raw form values.
    pub fn try_from_parts(
        name_value: Option<&str>,
        email_value: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let display_name =
            name_value.and_then(|raw| errors.check(parse_display_name("name", raw)));
        let email = email_value.and_then(|raw| errors.check(parse_email("email", raw)));

        errors.into_result(Self {
            display_name,
            email,
        })
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none()
    }
}

/// Validated password change.
///
/// A confirmation mismatch is reported against `new_password`, the field the
/// confirmation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current_password: Zeroizing<String>,
    new_password: Zeroizing<String>,
}

impl PasswordChange {
    /// Construct a password change from raw form values.
    pub fn try_from_parts(
        current_value: Option<&str>,
        new_value: Option<&str>,
        confirmation_value: Option<&str>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let current_password =
            errors.check(parse_password("current_password", current_value));
        let new_password = errors.check(parse_password("new_password", new_value).and_then(|new| {
            if confirmation_value == Some(new.as_str()) {
                Ok(new)
            } else {
                Err(FieldError::new(
                    "new_password",
                    FieldErrorCode::ConfirmationMismatch,
                    "new_password confirmation does not match",
                ))
            }
        }));

        match (current_password, new_password) {
            (Some(current_password), Some(new_password)) => Ok(Self {
                current_password,
                new_password,
            }),
            _ => Err(errors),
        }
    }

    pub fn current_password(&self) -> &str {
        self.current_password.as_str()
    }

    pub fn new_password(&self) -> &str {
        self.new_password.as_str()
    }
}
